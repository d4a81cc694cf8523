use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tasknest_core::auth::Claims;
use tasknest_core::config::AuthConfig;
use tasknest_core::error::TaskNestError;
use tasknest_core::AuthContext;
use tracing::debug;

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JwtAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl FromStr for JwtAlgorithm {
    type Err = TaskNestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            other => Err(TaskNestError::Config(format!(
                "Unsupported JWT algorithm '{}'",
                other
            ))),
        }
    }
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Bearer token verification.
///
/// Without a configured secret every request is anonymous.
#[derive(Clone)]
pub struct AuthMiddleware {
    algorithm: JwtAlgorithm,
    decoding_key: Option<DecodingKey>,
}

impl std::fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("algorithm", &self.algorithm)
            .field("decoding_key", &self.decoding_key.is_some())
            .finish()
    }
}

impl AuthMiddleware {
    pub fn from_config(config: &AuthConfig) -> Result<Self, TaskNestError> {
        let algorithm = config.algorithm.parse()?;
        let decoding_key = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| DecodingKey::from_secret(s.as_bytes()));

        Ok(Self {
            algorithm,
            decoding_key,
        })
    }

    /// Middleware that treats every request as anonymous.
    pub fn anonymous() -> Self {
        Self {
            algorithm: JwtAlgorithm::default(),
            decoding_key: None,
        }
    }

    /// Validate a JWT token and extract claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or_else(|| AuthError::InvalidToken("JWT secret not configured".to_string()))?;

        let mut validation = Validation::new(self.algorithm.into());
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 60;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                AuthError::InvalidToken("Invalid signature".to_string())
            }
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                AuthError::InvalidToken("Invalid token format".to_string())
            }
            jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::InvalidToken(format!("Missing required claim: {}", claim))
            }
            _ => AuthError::InvalidToken(e.to_string()),
        })?;

        Ok(token_data.claims)
    }
}

/// Authentication errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token expired")]
    TokenExpired,
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract auth context from request. Bad tokens yield an anonymous context.
pub fn extract_auth_context(req: &Request<Body>, middleware: &AuthMiddleware) -> AuthContext {
    match bearer_token(req) {
        Some(token) => match middleware.validate_token(token) {
            Ok(claims) => AuthContext::from_claims(claims),
            Err(e) => {
                debug!(error = %e, "Rejected bearer token");
                AuthContext::unauthenticated()
            }
        },
        None => AuthContext::unauthenticated(),
    }
}

/// Authentication middleware function.
pub async fn auth_middleware(
    State(middleware): State<Arc<AuthMiddleware>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth_context = extract_auth_context(&req, &middleware);
    req.extensions_mut().insert(auth_context);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tasknest_core::auth::ClaimsBuilder;

    use super::*;

    fn middleware(secret: &str) -> AuthMiddleware {
        AuthMiddleware::from_config(&AuthConfig {
            jwt_secret: Some(secret.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn create_test_claims(expired: bool) -> Claims {
        let secs = if expired { -3600 } else { 3600 };
        ClaimsBuilder::new()
            .subject("00u-alice")
            .preferred_username("alice")
            .name("Alice Smith")
            .role("user")
            .duration_secs(secs)
            .build()
            .unwrap()
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/categories");
        if let Some(value) = header {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("hs384".parse::<JwtAlgorithm>().unwrap(), JwtAlgorithm::HS384);
        assert_eq!(Algorithm::from(JwtAlgorithm::HS512), Algorithm::HS512);
        assert!(matches!(
            "RS256".parse::<JwtAlgorithm>(),
            Err(TaskNestError::Config(_))
        ));
    }

    #[test]
    fn test_valid_token_with_correct_secret() {
        let claims = create_test_claims(false);
        let token = create_test_token(&claims, "test-secret-key");

        let validated = middleware("test-secret-key").validate_token(&token).unwrap();
        assert_eq!(validated.sub, "00u-alice");
        assert_eq!(validated.principal_name(), "alice");
    }

    #[test]
    fn test_valid_token_with_wrong_secret() {
        let token = create_test_token(&create_test_claims(false), "wrong-secret");
        assert!(matches!(
            middleware("correct-secret").validate_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token() {
        let token = create_test_token(&create_test_claims(true), "test-secret");
        assert!(matches!(
            middleware("test-secret").validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_tampered_token() {
        let mut token = create_test_token(&create_test_claims(false), "test-secret");
        if let Some(last_char) = token.pop() {
            token.push(if last_char == 'a' { 'b' } else { 'a' });
        }
        assert!(middleware("test-secret").validate_token(&token).is_err());
    }

    #[test]
    fn test_invalid_token_format() {
        assert!(matches!(
            middleware("secret").validate_token("not-a-valid-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_anonymous_rejects_every_token() {
        let token = create_test_token(&create_test_claims(false), "secret");
        assert!(AuthMiddleware::anonymous().validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_auth_context() {
        let auth = middleware("secret");
        let token = create_test_token(&create_test_claims(false), "secret");

        let ctx = extract_auth_context(&request_with(Some(&format!("Bearer {}", token))), &auth);
        assert_eq!(ctx.name(), Some("alice"));

        let ctx = extract_auth_context(&request_with(Some("Basic abc")), &auth);
        assert!(!ctx.is_authenticated());

        let ctx = extract_auth_context(&request_with(Some("Bearer garbage")), &auth);
        assert!(!ctx.is_authenticated());

        let ctx = extract_auth_context(&request_with(None), &auth);
        assert!(!ctx.is_authenticated());
    }
}
