// Registration and login for the single local user

use thiserror::Error;
use tracing::{debug, info};

/// Input rejected before it reaches the message store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username is not correctly formatted, please ensure that your username contains an underscore and is no more than five characters in length.")]
    Username,

    #[error("Password is not correctly formatted; please ensure that the password contains at least eight characters, an uppercase letter, a lowercase letter, a number, and a special character.")]
    Password,

    #[error("Cell phone number incorrectly formatted or does not contain international code.")]
    Cellphone,

    #[error("Username already exists.")]
    DuplicateUsername,

    #[error("Message exceeds {limit} characters.")]
    PayloadTooLong { limit: usize },
}

/// A registered user and their remaining send allowance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub cellphone: String,
    quota: u32,
}

impl User {
    /// A negative quota is treated as zero
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        cellphone: impl Into<String>,
        quota: i64,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            password: password.into(),
            cellphone: cellphone.into(),
            quota: quota.clamp(0, u32::MAX as i64) as u32,
        }
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn has_quota(&self) -> bool {
        self.quota > 0
    }

    pub fn decrement_quota(&mut self) {
        self.quota = self.quota.saturating_sub(1);
    }
}

/// Username: contains an underscore, at most five characters
pub fn check_username(username: &str) -> bool {
    username.contains('_') && username.chars().count() <= 5
}

/// Password: eight or more characters with upper, lower, digit and symbol
pub fn check_password_complexity(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| !c.is_ascii_alphanumeric())
}

/// Cellphone: `+`, a 1-3 digit country code, then 4-12 subscriber digits
pub fn check_cellphone(cellphone: &str) -> bool {
    match cellphone.strip_prefix('+') {
        Some(digits) => {
            (5..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Reject payloads longer than `limit` characters
pub fn check_payload_length(payload: &str, limit: usize) -> Result<(), ValidationError> {
    if payload.chars().count() > limit {
        return Err(ValidationError::PayloadTooLong { limit });
    }
    Ok(())
}

/// In-memory user registry with a single logged-in slot
#[derive(Debug, Default)]
pub struct Login {
    users: Vec<User>,
    logged_in: Option<usize>,
}

impl Login {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a user
    pub fn register_user(
        &mut self,
        first_name: &str,
        last_name: &str,
        username: &str,
        password: &str,
        cellphone: &str,
        quota: i64,
    ) -> Result<(), ValidationError> {
        if !check_username(username) {
            return Err(ValidationError::Username);
        }
        if !check_password_complexity(password) {
            return Err(ValidationError::Password);
        }
        if !check_cellphone(cellphone) {
            return Err(ValidationError::Cellphone);
        }
        if self.users.iter().any(|u| u.username == username) {
            return Err(ValidationError::DuplicateUsername);
        }

        self.users.push(User::new(
            first_name, last_name, username, password, cellphone, quota,
        ));
        info!("Registered user {}", username);
        Ok(())
    }

    /// Attempt a login; a failed attempt clears any previous session
    pub fn login_user(&mut self, username: &str, password: &str) -> bool {
        self.logged_in = self
            .users
            .iter()
            .position(|u| u.username == username && u.password == password);

        debug!("Login attempt for {}: {}", username, self.logged_in.is_some());
        self.logged_in.is_some()
    }

    pub fn login_status(&self) -> String {
        match self.logged_in_user() {
            Some(u) => format!(
                "Welcome {} ,{} it is great to see you.",
                u.first_name, u.last_name
            ),
            None => "Username or password incorrect, please try again.".to_string(),
        }
    }

    pub fn logged_in_user(&self) -> Option<&User> {
        self.logged_in.and_then(|i| self.users.get(i))
    }

    pub fn logged_in_user_mut(&mut self) -> Option<&mut User> {
        match self.logged_in {
            Some(i) => self.users.get_mut(i),
            None => None,
        }
    }

    pub fn logout(&mut self) {
        self.logged_in = None;
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }
}
