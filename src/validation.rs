//! Client-side input validation. Failures block submission with inline
//! errors; the backend's own rules remain the authority.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest message content we let through client-side.
pub const MAX_MESSAGE_LEN: usize = 4000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex pattern is valid")
});

/// Validate message content before sending or saving an edit.
pub fn validate_message_content(content: &str) -> Result<(), String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("Message cannot be empty".to_string());
    }
    if trimmed.len() > MAX_MESSAGE_LEN {
        return Err(format!(
            "Message too long (max {} characters)",
            MAX_MESSAGE_LEN
        ));
    }
    Ok(())
}

/// Validate a channel name for creation.
pub fn validate_channel_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Channel name cannot be empty".to_string());
    }
    if name.len() < 2 {
        return Err("Channel name must be at least 2 characters".to_string());
    }
    if name.len() > 50 {
        return Err("Channel name too long (max 50 characters)".to_string());
    }
    if name.contains(|c: char| c.is_control() || c == ',') {
        return Err("Channel name contains invalid characters".to_string());
    }
    Ok(())
}

/// Validate a profile display name.
pub fn validate_display_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.len() < 2 {
        return Err("Name must be at least 2 characters".to_string());
    }
    if name.len() > 60 {
        return Err("Name too long (max 60 characters)".to_string());
    }
    Ok(())
}

/// Validate an email address for sign-in/sign-up forms.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if !EMAIL_RE.is_match(email.trim()) {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(())
}

/// Validate a password for sign-up.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() < 6 {
        return Err("Password must be at least 6 characters".to_string());
    }
    Ok(())
}
