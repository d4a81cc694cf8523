use std::collections::HashMap;

use super::Claims;

/// Authentication context attached to every request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Principal name (if authenticated).
    name: Option<String>,
    /// User roles.
    roles: Vec<String>,
    /// Custom claims from JWT.
    claims: HashMap<String, serde_json::Value>,
}

impl AuthContext {
    /// Create an unauthenticated context.
    pub fn unauthenticated() -> Self {
        Self {
            name: None,
            roles: Vec::new(),
            claims: HashMap::new(),
        }
    }

    /// Create an authenticated context.
    pub fn authenticated(
        name: impl Into<String>,
        roles: Vec<String>,
        claims: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            roles,
            claims,
        }
    }

    /// Build an authenticated context from validated token claims.
    pub fn from_claims(claims: Claims) -> Self {
        let name = claims.principal_name().to_string();
        Self::authenticated(name, claims.roles, claims.custom)
    }

    /// Check if the request is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    /// Get the principal name if authenticated.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Check if the user has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Get a custom claim value.
    pub fn claim(&self, key: &str) -> Option<&serde_json::Value> {
        self.claims.get(key)
    }

    /// Get all roles.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_unauthenticated() {
        let ctx = AuthContext::unauthenticated();
        assert!(!ctx.is_authenticated());
        assert!(ctx.name().is_none());
        assert!(ctx.roles().is_empty());
    }

    #[test]
    fn test_auth_context_authenticated() {
        let ctx = AuthContext::authenticated(
            "alice",
            vec!["admin".to_string(), "user".to_string()],
            HashMap::new(),
        );

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.name(), Some("alice"));
        assert!(ctx.has_role("admin"));
        assert!(!ctx.has_role("superadmin"));
    }

    #[test]
    fn test_from_claims_uses_principal_name() {
        let claims = Claims::builder()
            .subject("00u1")
            .preferred_username("carol@example.com")
            .name("Carol")
            .role("user")
            .build()
            .unwrap();

        let ctx = AuthContext::from_claims(claims);
        assert_eq!(ctx.name(), Some("carol@example.com"));
        assert!(ctx.has_role("user"));
        assert_eq!(ctx.claim("name"), Some(&serde_json::json!("Carol")));
    }
}
