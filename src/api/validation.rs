//! Client-side form validation for the auth flows.
//!
//! These checks run before any network call; violations are surfaced to the
//! user immediately and never sent to the server.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose address-shape check, the server does the authoritative one.
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Please enter a valid email address".to_string());
    }

    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.chars().count() < 2 {
        return Err("Name must be at least 2 characters".to_string());
    }

    if name.chars().count() > 50 {
        return Err("Name must be less than 50 characters".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_lower && has_upper && has_digit) {
        return Err(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        );
    }

    Ok(())
}

pub fn validate_password_confirmation(password: &str, repassword: &str) -> Result<(), String> {
    if repassword.is_empty() {
        return Err("Please confirm your password".to_string());
    }

    if password != repassword {
        return Err("Passwords don't match".to_string());
    }

    Ok(())
}

/// All registration-form checks, first failure wins.
pub fn validate_register(
    email: &str,
    name: &str,
    password: &str,
    repassword: &str,
) -> Result<(), String> {
    validate_email(email)?;
    validate_name(name)?;
    validate_password(password)?;
    validate_password_confirmation(password, repassword)?;
    Ok(())
}

/// Login only requires both fields to be present and the email well-formed.
pub fn validate_login(email: &str, password: &str) -> Result<(), String> {
    validate_email(email)?;
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    Ok(())
}
