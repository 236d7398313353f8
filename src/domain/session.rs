use crate::domain::UserProfile;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not logged in")]
    Unauthenticated,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid login form: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Session state handed to whatever needs to know who is acting and whether
/// they are logged in. Authentication is a mock credential check.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub authenticated: bool,
    pub profile: UserProfile,
}

impl SessionContext {
    pub fn new(profile: UserProfile) -> Self {
        Self {
            authenticated: false,
            profile,
        }
    }

    pub fn login(
        &mut self,
        credentials: &Credentials,
        expected: &Credentials,
    ) -> Result<(), SessionError> {
        credentials.validate()?;

        if credentials.email != expected.email || credentials.password != expected.password {
            self.authenticated = false;
            return Err(SessionError::InvalidCredentials);
        }

        self.authenticated = true;
        Ok(())
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
    }

    pub fn require_authenticated(&self) -> Result<(), SessionError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(SessionError::Unauthenticated)
        }
    }

    /// Simulated plan upgrade; no payment is taken.
    pub fn upgrade_to_premium(&mut self) {
        self.profile.is_premium = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionContext {
        SessionContext::new(UserProfile::new(
            "user123".to_string(),
            "user@example.com".to_string(),
        ))
    }

    fn expected() -> Credentials {
        Credentials::new("user@example.com", "password")
    }

    #[test]
    fn login_with_matching_credentials() {
        let mut s = session();
        assert!(matches!(s.require_authenticated(), Err(SessionError::Unauthenticated)));

        s.login(&expected(), &expected()).unwrap();
        assert!(s.require_authenticated().is_ok());

        s.logout();
        assert!(!s.authenticated);
    }

    #[test]
    fn login_rejects_wrong_password_and_short_form() {
        let mut s = session();
        let wrong = Credentials::new("user@example.com", "hunter22");
        assert!(matches!(
            s.login(&wrong, &expected()),
            Err(SessionError::InvalidCredentials)
        ));

        let short = Credentials::new("not-an-email", "abc");
        match s.login(&short, &expected()) {
            Err(SessionError::Invalid(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(!s.authenticated);
    }

    #[test]
    fn upgrade_sets_premium() {
        let mut s = session();
        s.upgrade_to_premium();
        assert!(s.profile.is_premium);
    }
}
