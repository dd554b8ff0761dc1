use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

// Default backend endpoint (overridden on the sign-in screen).
pub const DEFAULT_BACKEND_URL: &str = "https://chat.example.dev";

#[derive(Serialize, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    /// Public (anonymous) API key handed out by the hosted backend.
    pub anon_key: String,
    /// Remembered sign-in email. The password, if remembered, lives in the
    /// system keyring, never in this file.
    pub email: String,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            anon_key: String::new(),
            email: String::new(),
            theme: "dark".to_string(),
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("dev", "teamchat", "teamchat-client") {
        let dir = proj.config_dir();
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!("failed to create config dir: {}", e);
            return None;
        }
        return Some(dir.join("settings.json"));
    }
    None
}

pub fn load_settings() -> Option<Settings> {
    let path = settings_path()?;
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn save_settings(settings: &Settings) -> std::io::Result<()> {
    if let Some(path) = settings_path() {
        let mut file = fs::File::create(path)?;
        let data = serde_json::to_string_pretty(settings)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        file.write_all(data.as_bytes())?;
    }
    Ok(())
}

const KEYRING_SERVICE: &str = "teamchat-client";

/// Load the remembered password for an email from the system keyring.
pub fn load_saved_password(email: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, email).ok()?;
    entry.get_password().ok()
}

/// Remember a password in the system keyring.
pub fn store_saved_password(email: &str, password: &str) {
    match keyring::Entry::new(KEYRING_SERVICE, email) {
        Ok(entry) => {
            if let Err(e) = entry.set_password(password) {
                tracing::warn!("failed to store password in keyring: {}", e);
            }
        }
        Err(e) => tracing::warn!("keyring unavailable: {}", e),
    }
}

/// Forget a remembered password.
pub fn clear_saved_password(email: &str) {
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, email) {
        let _ = entry.delete_password();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.theme, "dark");
        assert!(settings.email.is_empty());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            backend_url: "https://backend.test".into(),
            anon_key: "anon".into(),
            email: "a@b.co".into(),
            theme: "light".into(),
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend_url, settings.backend_url);
        assert_eq!(back.email, settings.email);
    }
}
