//! Local multi-user accounts.
//!
//! Accounts are a convenience switch between people sharing one device, not
//! a security boundary: journal data is not partitioned per user. Passwords
//! are still stored as salted SHA-256 digests rather than plaintext.

use crate::model::UserAccount;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

const HASH_SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

/// Account validation and authentication failures.
///
/// The messages are shown inline next to the login/register form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("请填写完整信息")]
    MissingFields,

    #[error("该邮箱已注册")]
    DuplicateEmail,

    /// Deliberately identical for unknown email and wrong password.
    #[error("邮箱或密码错误")]
    InvalidCredentials,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format_hash(&salt, password)
}

/// Check a password against a stored hash. Unparseable hashes never verify.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(scheme), Some(salt), Some(_)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if scheme != HASH_SCHEME {
        return false;
    }
    match STANDARD_NO_PAD.decode(salt) {
        Ok(salt) => format_hash(&salt, password) == stored,
        Err(_) => false,
    }
}

fn format_hash(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    format!(
        "{HASH_SCHEME}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(digest)
    )
}

/// The account list and the logged-in pointer.
#[derive(Debug, Clone, Default)]
pub struct Accounts {
    users: Vec<UserAccount>,
    current: Option<String>,
}

impl Accounts {
    /// Restore accounts; a pointer to a vanished account is dropped.
    pub fn new(users: Vec<UserAccount>, current: Option<String>) -> Self {
        let current = current.filter(|id| users.iter().any(|u| &u.id == id));
        Self { users, current }
    }

    /// All accounts, newest first.
    pub fn users(&self) -> &[UserAccount] {
        &self.users
    }

    pub fn current(&self) -> Option<&UserAccount> {
        let id = self.current.as_deref()?;
        self.users.iter().find(|u| u.id == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn find(&self, id: &str) -> Option<&UserAccount> {
        self.users.iter().find(|u| u.id == id)
    }

    fn find_by_email(&self, email: &str) -> Option<&UserAccount> {
        let email = email.trim().to_lowercase();
        self.users.iter().find(|u| u.email.to_lowercase() == email)
    }

    /// Create an account and log it in.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<&UserAccount, AuthError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        if self.find_by_email(email).is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let user = UserAccount {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password),
        };
        info!(user_id = %user.id, "registered account");
        self.current = Some(user.id.clone());
        self.users.insert(0, user);
        Ok(&self.users[0])
    }

    /// Log in with an email (any case) and exact password.
    pub fn login(&mut self, email: &str, password: &str) -> Result<&UserAccount, AuthError> {
        let id = match self.find_by_email(email) {
            Some(user) if verify_password(&user.password_hash, password) => user.id.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        self.current = Some(id);
        self.current().ok_or(AuthError::InvalidCredentials)
    }

    pub fn logout(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip_and_salt() {
        let a = hash_password("kiln");
        let b = hash_password("kiln");
        assert_ne!(a, b, "salts should differ");
        assert!(a.starts_with("sha256$"));
        assert!(!a.contains("kiln"));
        assert!(verify_password(&a, "kiln"));
        assert!(!verify_password(&a, "Kiln"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("kiln", "kiln"));
        assert!(!verify_password("md5$abc$def", "kiln"));
        assert!(!verify_password("sha256$!!!$def", "kiln"));
    }

    #[test]
    fn test_register_requires_all_fields() {
        let mut accounts = Accounts::default();
        assert_eq!(
            accounts.register("  ", "a@b.c", "pw").unwrap_err(),
            AuthError::MissingFields
        );
        assert_eq!(
            accounts.register("Ann", "a@b.c", "   ").unwrap_err(),
            AuthError::MissingFields
        );
        assert!(accounts.users().is_empty());
    }

    #[test]
    fn test_register_rejects_case_insensitive_duplicate() {
        let mut accounts = Accounts::default();
        accounts.register("Ann", "Ann@Example.com", "pw").unwrap();
        assert_eq!(
            accounts.register("Other", "ann@example.COM", "pw2").unwrap_err(),
            AuthError::DuplicateEmail
        );
        assert_eq!(accounts.users().len(), 1);
    }

    #[test]
    fn test_register_logs_in_and_prepends() {
        let mut accounts = Accounts::default();
        accounts.register("First", "first@x.io", "pw").unwrap();
        let second_id = accounts.register(" Second ", " second@x.io ", "pw").unwrap().id.clone();
        assert_eq!(accounts.users()[0].name, "Second");
        assert_eq!(accounts.users()[0].email, "second@x.io");
        assert_eq!(accounts.current_id(), Some(second_id.as_str()));
    }

    #[test]
    fn test_login_errors_are_indistinguishable() {
        let mut accounts = Accounts::default();
        accounts.register("Ann", "ann@x.io", "secret").unwrap();
        accounts.logout();

        let wrong_password = accounts.login("ann@x.io", "nope").unwrap_err();
        let unknown_email = accounts.login("bob@x.io", "secret").unwrap_err();
        assert_eq!(wrong_password, unknown_email);
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(accounts.current().is_none());

        let user = accounts.login("ANN@x.io", "secret").unwrap();
        assert_eq!(user.name, "Ann");
    }

    #[test]
    fn test_restore_drops_dangling_pointer() {
        let accounts = Accounts::new(Vec::new(), Some("gone".to_string()));
        assert!(accounts.current().is_none());
        assert!(accounts.current_id().is_none());
    }
}
