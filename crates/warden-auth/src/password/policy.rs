//! Password rules for new accounts.

use warden_core::config::AuthConfig;
use warden_core::error::AppError;

/// Checks new passwords against the configured rules.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
}

impl PasswordPolicy {
    /// Policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Rejects passwords shorter than the minimum (counted in characters) or
    /// made only of whitespace.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.trim().is_empty() {
            return Err(AppError::validation("Password must not be blank"));
        }
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_length_counts_characters() {
        let policy = PasswordPolicy::new(&AuthConfig::default());
        assert!(policy.validate("12345").is_err());
        assert!(policy.validate("123456").is_ok());
        assert!(policy.validate("密码密码密码").is_ok());
        assert!(policy.validate("      ").is_err());
    }
}
