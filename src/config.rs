use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub auth_jwt_public_key: Option<String>, // Ed25519 public key (PEM)
    pub auth_jwt_secret: Option<String>,     // HS256 shared secret
    pub auth_issuer: Option<String>,
    pub auth_audience: Option<String>,
    pub push_gateway_url: String,
    pub push_gateway_token: String,
    pub realtime_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let auth_jwt_public_key = env::var("AUTH_JWT_PUBLIC_KEY").ok();
        let auth_jwt_secret = env::var("AUTH_JWT_SECRET").ok();
        if auth_jwt_public_key.is_none() && auth_jwt_secret.is_none() {
            panic!("AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET must be set");
        }

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            auth_jwt_public_key,
            auth_jwt_secret,
            auth_issuer: env::var("AUTH_ISSUER").ok(),
            auth_audience: env::var("AUTH_AUDIENCE").ok(),
            push_gateway_url: env::var("PUSH_GATEWAY_URL").unwrap_or_else(|_| "http://localhost:8080/v1/push".to_string()),
            push_gateway_token: env::var("PUSH_GATEWAY_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            realtime_channel_capacity: env::var("REALTIME_CHANNEL_CAPACITY")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .expect("REALTIME_CHANNEL_CAPACITY must be a number"),
        }
    }
}
