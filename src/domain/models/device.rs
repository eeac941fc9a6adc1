use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use super::text_enum;

text_enum! {
    DeviceType {
        Ios => "IOS",
        Android => "ANDROID",
        Web => "WEB",
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub fcm_token: String,
    #[sqlx(try_from = "String")]
    pub device_type: DeviceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewDevice {
    pub fcm_token: String,
    pub device_type: DeviceType,
}

impl Device {
    pub fn new(user_id: String, input: &NewDevice) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            fcm_token: input.fcm_token.trim().to_string(),
            device_type: input.device_type,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct NotificationLog {
    pub id: String,
    pub event_id: String,
    pub title: String,
    pub message: String,
    pub fcm_token: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NotificationLog {
    pub fn new(event_id: String, title: String, message: String, outcome: &PushOutcome) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            title,
            message,
            fcm_token: outcome.token.clone(),
            success: outcome.success,
            error_message: outcome.error.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Delivery result for one device token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PushOutcome {
    pub token: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}
