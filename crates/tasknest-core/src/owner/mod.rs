use std::fmt;

use crate::auth::AuthContext;
use crate::config::AuthConfig;
use crate::error::{Result, TaskNestError};

/// Stable owner key every data-access operation is scoped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Owner {
    name: String,
    guest: bool,
}

impl Owner {
    /// Owner resolved from an authenticated principal.
    pub fn principal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guest: false,
        }
    }

    /// The fixed guest owner.
    pub fn guest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guest: true,
        }
    }

    /// Owner name, matched against `User::name`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this owner is the fixed guest identity.
    pub fn is_guest(&self) -> bool {
        self.guest
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// How an owner is derived from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerStrategy {
    /// Owner is the authenticated principal; anonymous requests are rejected.
    Authenticated,
    /// Every request acts as the same guest user.
    FixedGuest { name: String },
}

impl OwnerStrategy {
    /// Select the strategy from auth configuration.
    ///
    /// A configured token secret means an auth provider exists, so callers
    /// must authenticate. Otherwise all requests share the guest owner.
    pub fn from_config(config: &AuthConfig) -> Self {
        if config.has_provider() {
            Self::Authenticated
        } else {
            Self::FixedGuest {
                name: config.guest_name.clone(),
            }
        }
    }

    /// Resolve the owner for a request.
    pub fn resolve(&self, auth: &AuthContext) -> Result<Owner> {
        match self {
            Self::FixedGuest { name } => Ok(Owner::guest(name.clone())),
            Self::Authenticated => auth
                .name()
                .map(Owner::principal)
                .ok_or_else(|| TaskNestError::Unauthorized("Authentication required".into())),
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticated => "authenticated",
            Self::FixedGuest { .. } => "fixed_guest",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_no_provider_selects_guest() {
        let strategy = OwnerStrategy::from_config(&AuthConfig::default());
        assert_eq!(
            strategy,
            OwnerStrategy::FixedGuest {
                name: "guest".into()
            }
        );

        let owner = strategy.resolve(&AuthContext::unauthenticated()).unwrap();
        assert_eq!(owner.name(), "guest");
        assert!(owner.is_guest());
    }

    #[test]
    fn test_guest_ignores_principal() {
        let strategy = OwnerStrategy::FixedGuest {
            name: "demo".into(),
        };
        let auth = AuthContext::authenticated("alice", vec![], HashMap::new());
        assert_eq!(strategy.resolve(&auth).unwrap().name(), "demo");
    }

    #[test]
    fn test_provider_selects_authenticated() {
        let config = AuthConfig {
            jwt_secret: Some("secret".into()),
            ..Default::default()
        };
        let strategy = OwnerStrategy::from_config(&config);
        assert_eq!(strategy, OwnerStrategy::Authenticated);
        assert_eq!(strategy.as_str(), "authenticated");

        let auth = AuthContext::authenticated("alice", vec![], HashMap::new());
        let owner = strategy.resolve(&auth).unwrap();
        assert_eq!(owner, Owner::principal("alice"));
        assert!(!owner.is_guest());
    }

    #[test]
    fn test_authenticated_rejects_anonymous() {
        let err = OwnerStrategy::Authenticated
            .resolve(&AuthContext::unauthenticated())
            .unwrap_err();
        assert!(matches!(err, TaskNestError::Unauthorized(_)));
    }
}
