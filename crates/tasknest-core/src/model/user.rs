use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

const PBKDF2_ROUNDS: u32 = 100_000;
const SALT_LEN: usize = 32;
const HASH_LEN: usize = 32;

/// Salt and password hash, both base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub salt: String,
    pub hash: String,
}

impl Credentials {
    /// Derive credentials for a password with a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            salt: STANDARD.encode(salt),
            hash: STANDARD.encode(hash_password(password, &salt)),
        }
    }

    /// Check a password in constant time. Undecodable salts or hashes never match.
    pub fn verify(&self, password: &str) -> bool {
        let (Ok(salt), Ok(expected)) = (STANDARD.decode(&self.salt), STANDARD.decode(&self.hash))
        else {
            return false;
        };
        hash_password(password, &salt)[..].ct_eq(&expected).into()
    }
}

fn hash_password(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut out);
    out
}

/// A principal that owns categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub guid: Uuid,
    pub name: String,
    /// Absent for users provisioned on first write.
    pub credentials: Option<Credentials>,
}

impl User {
    /// Create an unsaved user without credentials.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            guid: Uuid::new_v4(),
            name: name.into(),
            credentials: None,
        }
    }

    /// Create an unsaved user with a hashed password.
    pub fn with_password(name: impl Into<String>, password: &str) -> Self {
        Self {
            credentials: Some(Credentials::derive(password)),
            ..Self::new(name)
        }
    }

    /// Verify a password against the stored credentials.
    pub fn check_password(&self, password: &str) -> bool {
        self.credentials
            .as_ref()
            .map(|c| c.verify(password))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_check() {
        let user = User::with_password("alice", "correct horse");
        assert!(user.check_password("correct horse"));
        assert!(!user.check_password("battery staple"));
    }

    #[test]
    fn test_credentials_fit_column() {
        let creds = Credentials::derive("pw");
        assert_eq!(creds.salt.len(), 44);
        assert_eq!(creds.hash.len(), 44);
        assert_ne!(creds, Credentials::derive("pw"));
    }

    #[test]
    fn test_user_without_credentials_never_matches() {
        let user = User::new("guest");
        assert!(!user.check_password(""));
    }

    #[test]
    fn test_corrupt_salt_never_matches() {
        let creds = Credentials {
            salt: "not base64!".into(),
            hash: String::new(),
        };
        assert!(!creds.verify("pw"));
    }

    #[test]
    fn test_truncated_hash_never_matches() {
        let mut creds = Credentials::derive("pw");
        assert!(creds.verify("pw"));

        let hash = STANDARD.decode(&creds.hash).unwrap();
        creds.hash = STANDARD.encode(&hash[..HASH_LEN - 1]);
        assert!(!creds.verify("pw"));

        creds.hash = "%%%".into();
        assert!(!creds.verify("pw"));
    }
}
