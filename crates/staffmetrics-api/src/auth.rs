//! Bearer-token authentication.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::ApiError;
use crate::settings::JwtConfig;
use crate::state::ApiState;

/// Claims carried by an API token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("signing secret is empty")]
    MissingSecret,
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Authenticated caller, inserted into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(pub String);

/// Issues and validates HS256 tokens.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Result<Self, JwtError> {
        if config.secret.is_empty() {
            return Err(JwtError::MissingSecret);
        }
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Token for `subject`, valid for `ttl_minutes` (or the configured TTL).
    pub fn issue(&self, subject: &str, ttl_minutes: Option<i64>) -> Result<String, JwtError> {
        let now = Utc::now();
        let ttl = ttl_minutes.unwrap_or(self.config.token_ttl_minutes);
        let claims = Claims {
            sub: subject.to_string(),
            exp: (now + Duration::minutes(ttl)).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| JwtError::Generation(err.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iss", "aud"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(err.to_string()),
            })
    }

    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// Middleware: require a valid `Authorization: Bearer` token and record the
/// caller as a [`Subject`].
pub async fn require_auth(
    State(state): State<ApiState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(JwtService::extract_from_header)
        .ok_or(ApiError::Unauthorized)?;

    match state.jwt.validate(token) {
        Ok(claims) => {
            req.extensions_mut().insert(Subject(claims.sub));
            Ok(next.run(req).await)
        }
        Err(err) => {
            warn!(error = %err, uri = %req.uri(), "authentication failed");
            match err {
                JwtError::Expired => Err(ApiError::TokenExpired),
                _ => Err(ApiError::Unauthorized),
            }
        }
    }
}
