use gatherly::{
    api::router::create_router,
    config::Config,
    domain::{
        models::{auth::IdentityClaims, device::{PushMessage, PushOutcome}, user::User},
        ports::PushService,
    },
    error::AppError,
    infra::factory::{run_sqlite_migrations, sqlite_repositories},
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;
use serde_json::{json, Value};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Records every multicast. Tokens starting with `bad-` are reported as failed.
#[derive(Default)]
pub struct MockPushService {
    pub calls: Mutex<Vec<(Vec<String>, PushMessage)>>,
}

#[async_trait]
impl PushService for MockPushService {
    async fn send_multicast(&self, tokens: &[String], message: &PushMessage) -> Result<Vec<PushOutcome>, AppError> {
        self.calls.lock().unwrap().push((tokens.to_vec(), message.clone()));
        Ok(tokens
            .iter()
            .map(|t| PushOutcome {
                token: t.clone(),
                success: !t.starts_with("bad-"),
                error: t.starts_with("bad-").then(|| "Unregistered token".to_string()),
            })
            .collect())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub push: Arc<MockPushService>,
}

#[allow(dead_code)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        run_sqlite_migrations(&pool).await;

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            auth_jwt_public_key: None,
            auth_jwt_secret: Some(TEST_JWT_SECRET.to_string()),
            auth_issuer: None,
            auth_audience: None,
            push_gateway_url: "http://localhost".to_string(),
            push_gateway_token: "token".to_string(),
            realtime_channel_capacity: 16,
        };

        let push = Arc::new(MockPushService::default());
        let state = Arc::new(AppState::assemble(&config, sqlite_repositories(pool.clone()), push.clone()));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            push,
        }
    }

    pub fn mint_token(sub: &str, email: Option<&str>, name: Option<&str>) -> String {
        let claims = IdentityClaims {
            sub: sub.to_string(),
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
            email: email.map(str::to_string),
            name: name.map(str::to_string),
            picture: None,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes())).unwrap()
    }

    /// Mints a token for `email` and provisions the matching local user.
    pub async fn sign_in(&self, email: &str) -> SignedIn {
        let sub = format!("uid-{}", email);
        let token = Self::mint_token(&sub, Some(email), email.split('@').next());
        let claims = self.state.auth_service.verify(&token).unwrap();
        let user = self.state.identity.resolve(&claims).await.unwrap();
        SignedIn { token, user }
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// Creates an event through the API and returns its `data` payload.
    pub async fn create_event(&self, token: &str, name: &str, visibility: &str) -> Value {
        let start = Utc::now() + chrono::Duration::days(7);
        let payload = json!({
            "name": name,
            "description": "An evening together",
            "start_date": start.to_rfc3339(),
            "end_date": (start + chrono::Duration::hours(6)).to_rfc3339(),
            "visibility": visibility,
            "type": "WEDDING",
        });
        let (status, body) = self.request("POST", "/api/v1/events", Some(token), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "create_event failed: {body}");
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
