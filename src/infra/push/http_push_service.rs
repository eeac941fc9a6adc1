use crate::domain::models::device::{PushMessage, PushOutcome};
use crate::domain::ports::PushService;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

pub struct HttpPushService {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpPushService {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct MulticastPayload<'a> {
    tokens: &'a [String],
    title: &'a str,
    body: &'a str,
    data: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct MulticastResponse {
    results: Vec<PushOutcome>,
}

#[async_trait]
impl PushService for HttpPushService {
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> Result<Vec<PushOutcome>, AppError> {
        let payload = MulticastPayload {
            tokens,
            title: &message.title,
            body: &message.body,
            data: &message.data,
        };

        let res = self.client.post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Push gateway connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Push gateway failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        let body: MulticastResponse = res.json().await.map_err(|e| {
            let msg = format!("Push gateway returned an unreadable body: {}", e);
            error!("{}", msg);
            AppError::InternalWithMsg(msg)
        })?;

        // Tokens the gateway did not report on count as failures.
        let outcomes = tokens
            .iter()
            .map(|token| {
                body.results
                    .iter()
                    .find(|r| &r.token == token)
                    .cloned()
                    .unwrap_or_else(|| PushOutcome {
                        token: token.clone(),
                        success: false,
                        error: Some("No result reported by gateway".into()),
                    })
            })
            .collect();
        Ok(outcomes)
    }
}
