//! User records and create-user input rules.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user as listed by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Fields submitted by the create-user form, exactly as received.
///
/// Absent fields deserialize as empty strings and fail validation.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateUserForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for CreateUserForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Sanitized payload sent to the upstream `POST /users`.
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// First rule a submitted form breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username must be 3-50 characters")]
    Username,
    #[error("Valid email is required")]
    Email,
    #[error("Password must be at least 6 characters")]
    Password,
}

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Lower-case the domain part; the local part is case-sensitive.
fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_ascii_lowercase()),
        None => email.to_string(),
    }
}

impl CreateUserForm {
    /// Check the rules in order and return the sanitized payload, or the
    /// first rule broken.
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let username = self.username.trim();
        let username_len = username.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
            return Err(ValidationError::Username);
        }

        let email = self.email.as_str();
        if email.len() > 254 || !email_pattern().is_match(email) {
            return Err(ValidationError::Email);
        }

        if self.password.chars().count() < PASSWORD_MIN {
            return Err(ValidationError::Password);
        }

        Ok(NewUser {
            username: username.to_string(),
            email: normalize_email(email),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str) -> CreateUserForm {
        CreateUserForm {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn first_failing_rule_wins() {
        assert_eq!(
            form("ab", "bad", "123").validate().unwrap_err(),
            ValidationError::Username
        );
        assert_eq!(
            form("alice", "bad", "123").validate().unwrap_err(),
            ValidationError::Email
        );
        assert_eq!(
            form("alice", "alice@example.com", "123").validate().unwrap_err(),
            ValidationError::Password
        );
    }

    #[test]
    fn messages_match_the_form_copy() {
        assert_eq!(
            ValidationError::Username.to_string(),
            "Username must be 3-50 characters"
        );
        assert_eq!(ValidationError::Email.to_string(), "Valid email is required");
        assert_eq!(
            ValidationError::Password.to_string(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn username_is_trimmed_before_length_check() {
        assert_eq!(
            form("  ab  ", "a@example.com", "secret1").validate().unwrap_err(),
            ValidationError::Username
        );
        let user = form("  alice ", "a@example.com", "secret1").validate().unwrap();
        assert_eq!(user.username, "alice");
        assert!(form(&"x".repeat(51), "a@example.com", "secret1").validate().is_err());
        assert!(form(&"x".repeat(50), "a@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn email_domain_is_normalized() {
        let user = form("alice", "Alice@Example.COM", "secret1").validate().unwrap();
        assert_eq!(user.email, "Alice@example.com");
    }

    #[test]
    fn padded_email_is_rejected_not_trimmed() {
        for email in [" a@b.com", "a@b.com ", " a@b.com "] {
            assert_eq!(
                form("alice", email, "secret1").validate().unwrap_err(),
                ValidationError::Email,
                "{email:?}"
            );
        }
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "plain", "a@b", "a@@b.com", "a b@c.com", "a@-b.com"] {
            assert_eq!(
                form("alice", email, "secret1").validate().unwrap_err(),
                ValidationError::Email,
                "{email}"
            );
        }
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", form("alice", "a@example.com", "hunter22"));
        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn users_tolerate_missing_fields() {
        let users: Vec<User> =
            serde_json::from_str(r#"[{"id": 1, "username": "alice", "extra": true}]"#).unwrap();
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].email, "");
    }
}
