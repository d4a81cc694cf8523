use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal identifier).
    pub sub: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// User roles.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Custom claims.
    #[serde(flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Principal name: `preferred_username`, then `sub`.
    ///
    /// The `name` claim is a display name and is not unique across principals,
    /// so it never keys an owner.
    pub fn principal_name(&self) -> &str {
        self.custom
            .get("preferred_username")
            .and_then(|v| v.as_str())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.sub)
    }

    /// Display name from the `name` claim, if present.
    pub fn display_name(&self) -> Option<&str> {
        self.custom.get("name").and_then(|v| v.as_str())
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }

    /// Check if the user has a role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Get a custom claim value.
    pub fn get_claim(&self, key: &str) -> Option<&serde_json::Value> {
        self.custom.get(key)
    }

    /// Create a builder for constructing claims.
    pub fn builder() -> ClaimsBuilder {
        ClaimsBuilder::new()
    }
}

/// Builder for JWT claims.
#[derive(Debug, Default)]
pub struct ClaimsBuilder {
    sub: Option<String>,
    roles: Vec<String>,
    custom: HashMap<String, serde_json::Value>,
    duration_secs: i64,
}

impl ClaimsBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            sub: None,
            roles: Vec::new(),
            custom: HashMap::new(),
            duration_secs: 3600,
        }
    }

    /// Set the subject.
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the display name carried in the `name` claim.
    pub fn name(self, name: impl Into<String>) -> Self {
        self.claim("name", serde_json::Value::String(name.into()))
    }

    /// Set the unique login carried in the `preferred_username` claim.
    pub fn preferred_username(self, username: impl Into<String>) -> Self {
        self.claim(
            "preferred_username",
            serde_json::Value::String(username.into()),
        )
    }

    /// Add a role.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a custom claim.
    pub fn claim(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.custom.insert(key.into(), value);
        self
    }

    /// Set token duration in seconds.
    pub fn duration_secs(mut self, secs: i64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Build the claims.
    pub fn build(self) -> Result<Claims, String> {
        let sub = self.sub.ok_or("Subject is required")?;
        let now = chrono::Utc::now().timestamp();

        Ok(Claims {
            sub,
            iat: now,
            exp: now + self.duration_secs,
            roles: self.roles,
            custom: self.custom,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_builder() {
        let claims = Claims::builder()
            .subject("00u1")
            .preferred_username("alice@example.com")
            .name("Alice")
            .role("admin")
            .claim("tenant", serde_json::json!("acme"))
            .duration_secs(7200)
            .build()
            .unwrap();

        assert_eq!(claims.principal_name(), "alice@example.com");
        assert_eq!(claims.display_name(), Some("Alice"));
        assert!(claims.has_role("admin"));
        assert!(!claims.has_role("user"));
        assert_eq!(claims.get_claim("tenant"), Some(&serde_json::json!("acme")));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_principal_name_fallbacks() {
        let claims = Claims::builder()
            .subject("sub-1")
            .claim("preferred_username", serde_json::json!("bob@example.com"))
            .build()
            .unwrap();
        assert_eq!(claims.principal_name(), "bob@example.com");

        let claims = Claims::builder().subject("sub-2").build().unwrap();
        assert_eq!(claims.principal_name(), "sub-2");

        let claims = Claims::builder()
            .subject("sub-3")
            .preferred_username(" ")
            .build()
            .unwrap();
        assert_eq!(claims.principal_name(), "sub-3");
    }

    #[test]
    fn test_display_name_never_keys_principal() {
        let claims = Claims::builder()
            .subject("sub-4")
            .name("Alex Smith")
            .build()
            .unwrap();
        assert_eq!(claims.principal_name(), "sub-4");
        assert_eq!(claims.display_name(), Some("Alex Smith"));
    }

    #[test]
    fn test_claims_expiration() {
        let claims = Claims {
            sub: "user-1".to_string(),
            iat: 0,
            exp: 1,
            roles: vec![],
            custom: HashMap::new(),
        };

        assert!(claims.is_expired());
    }

    #[test]
    fn test_builder_requires_subject() {
        assert!(ClaimsBuilder::new().build().is_err());
    }
}
