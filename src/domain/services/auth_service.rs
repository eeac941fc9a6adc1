use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tracing::debug;
use crate::config::Config;
use crate::domain::models::auth::IdentityClaims;
use crate::error::AppError;

/// Verifies identity-provider tokens. Sessions and passwords live with the provider.
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(config: &Config) -> Self {
        let (decoding_key, algorithm) = match (&config.auth_jwt_public_key, &config.auth_jwt_secret) {
            (Some(pem), _) => (
                DecodingKey::from_ed_pem(pem.as_bytes()).expect("Invalid JWT Public Key PEM"),
                Algorithm::EdDSA,
            ),
            (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            (None, None) => panic!("AUTH_JWT_PUBLIC_KEY or AUTH_JWT_SECRET must be set"),
        };

        let mut validation = Validation::new(algorithm);
        match &config.auth_issuer {
            Some(iss) => validation.set_issuer(&[iss]),
            None => validation.iss = None,
        }
        match &config.auth_audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self { decoding_key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AppError> {
        decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AppError::Unauthorized("Invalid or expired token".into())
            })
    }
}
