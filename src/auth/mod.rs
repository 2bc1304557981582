//! Authentication and authorization.
//!
//! JWT bearer tokens back the admin surface; role flags on the contact
//! record (`is_superuser`, `is_donor`, `is_requester`) plus ownership
//! drive the per-entity permission matrix in [`access`].

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::entities::contact;

pub mod access;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub organisation_id: Option<i32>,
    pub is_superuser: bool,
    pub is_donor: bool,
    pub is_requester: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated user data extracted from a validated token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub contact_id: i32,
    pub name: Option<String>,
    pub email: Option<String>,
    pub organisation_id: Option<i32>,
    pub is_superuser: bool,
    pub is_donor: bool,
    pub is_requester: bool,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.is_superuser
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_expiry: Duration,
    pub refresh_token_expiry: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        issuer: String,
        audience: String,
        access_token_expiry: Duration,
        refresh_token_expiry: Duration,
    ) -> Result<Self, AuthError> {
        if jwt_secret.len() < 32 {
            return Err(AuthError::InternalError(
                "JWT secret must be at least 32 bytes".to_string(),
            ));
        }
        Ok(Self {
            jwt_secret,
            issuer,
            audience,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Access/refresh token pair returned by login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("insufficient permissions")]
    InsufficientPermissions,
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    #[error("internal auth error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "AUTH_MISSING"),
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_TOKEN"),
            AuthError::ExpiredToken => (StatusCode::UNAUTHORIZED, "AUTH_EXPIRED_TOKEN"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "AUTH_BAD_CREDENTIALS"),
            AuthError::AccountDisabled => (StatusCode::FORBIDDEN, "AUTH_ACCOUNT_DISABLED"),
            AuthError::InsufficientPermissions => (StatusCode::FORBIDDEN, "AUTH_FORBIDDEN"),
            AuthError::DatabaseError(_) | AuthError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_INTERNAL_ERROR")
            }
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// JWT issuing and validation over the contacts table.
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Verify email/password and issue a token pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = contact::Entity::find()
            .filter(contact::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.active {
            return Err(AuthError::AccountDisabled);
        }

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;

        self.generate_token(&user)
    }

    /// Issue a token pair for a contact.
    pub fn generate_token(&self, user: &contact::Model) -> Result<TokenPair, AuthError> {
        let access = self.encode_claims(user, self.config.access_token_expiry)?;
        let refresh = self.encode_claims(user, self.config.refresh_token_expiry)?;

        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiry.as_secs(),
        })
    }

    fn encode_claims(&self, user: &contact::Model, expiry: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: Some(user.display_name()),
            email: Some(user.email.clone()),
            organisation_id: user.organisation_id,
            is_superuser: user.is_superuser,
            is_donor: user.is_donor,
            is_requester: user.is_requester,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::seconds(expiry.as_secs() as i64)).timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Validate a bearer token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken(e.to_string()),
        })
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::InternalError(e.to_string()))
}

fn auth_user_from_claims(claims: Claims) -> Result<AuthUser, AuthError> {
    let contact_id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| AuthError::InvalidToken("non-numeric subject".to_string()))?;

    Ok(AuthUser {
        contact_id,
        name: claims.name,
        email: claims.email,
        organisation_id: claims.organisation_id,
        is_superuser: claims.is_superuser,
        is_donor: claims.is_donor,
        is_requester: claims.is_requester,
    })
}

/// Authentication middleware: validates the bearer token and stores the
/// resulting [`AuthUser`] in request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "authentication service not available",
            )
                .into_response();
        }
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return AuthError::MissingAuth.into_response();
    };

    match auth_service
        .validate_token(token)
        .and_then(auth_user_from_claims)
    {
        Ok(user) => {
            debug!(contact_id = user.contact_id, "request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Gate middleware requiring the superuser flag.
pub async fn staff_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingAuth)?;

    if !user.is_staff() {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to apply auth gates.
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_staff(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_staff(self) -> Self {
        self.layer(axum::middleware::from_fn(staff_middleware))
            .with_auth()
    }
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Login handler: verifies credentials against the contacts table.
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = auth_service
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(pair))
}

/// Authentication routes.
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new().route("/login", axum::routing::post(login_handler))
}
