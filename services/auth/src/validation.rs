//! Input validation utilities
//!
//! Validators return `Result<(), String>` with the message shown next to
//! the field. [`FieldErrors`] collects them per field for a whole form.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::LoginCredentials;

/// Minimum password length on the login form
pub const LOGIN_PASSWORD_MIN: usize = 6;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("El correo es requerido".to_string());
    }

    if email.len() > 254 {
        return Err("Correo inválido".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Correo inválido".to_string());
    }

    Ok(())
}

/// Require at least `min` characters (not bytes)
pub fn validate_min_chars(value: &str, min: usize, message: &str) -> Result<(), String> {
    if value.trim().chars().count() < min {
        return Err(message.to_string());
    }
    Ok(())
}

/// Validate the login form
pub fn validate_login(credentials: &LoginCredentials) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    errors.check("email", validate_email(&credentials.email));
    errors.check(
        "password",
        if credentials.password.is_empty() {
            Err("La contraseña es requerida".to_string())
        } else if credentials.password.chars().count() < LOGIN_PASSWORD_MIN {
            Err("La contraseña debe tener al menos 6 caracteres".to_string())
        } else {
            Ok(())
        },
    );
    errors.into_result()
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Record the outcome of a validator; the first error per field wins
    pub fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.0.entry(field.to_string()).or_insert(message);
        }
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("ana@uca.edu.ni").is_ok());
        assert_eq!(validate_email("").unwrap_err(), "El correo es requerido");
        assert_eq!(validate_email("ana@").unwrap_err(), "Correo inválido");
    }

    #[test]
    fn test_min_chars_counts_characters() {
        assert!(validate_min_chars("ñañ", 3, "x").is_ok());
        assert!(validate_min_chars("  a ", 2, "x").is_err());
    }

    #[test]
    fn test_login_form() {
        let ok = LoginCredentials {
            email: "ana@x.org".into(),
            password: "123456".into(),
        };
        assert!(validate_login(&ok).is_ok());

        let bad = LoginCredentials {
            email: "nope".into(),
            password: "123".into(),
        };
        let errors = validate_login(&bad).unwrap_err();
        assert_eq!(errors.get("email"), Some("Correo inválido"));
        assert_eq!(
            errors.get("password"),
            Some("La contraseña debe tener al menos 6 caracteres")
        );
    }
}
