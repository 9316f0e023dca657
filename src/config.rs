//! Process configuration, loaded once from the environment at startup.

pub const APP_NAME: &str = "taxdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `RUST_LOG`-style filter when the env var is absent.
pub fn default_log_filter() -> String {
    "taxdesk=info".to_string()
}

/// Runtime settings for backend access, model invocation, and the HTTP
/// trigger surface. Collaborator clients receive these explicitly — there
/// is no process-wide settings singleton.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the office backend REST API.
    pub backend_base_url: String,
    /// Bearer token for the backend API (empty = unauthenticated).
    pub backend_token: String,
    /// Base URL of the generative model gateway.
    pub model_base_url: String,
    /// API key for the model gateway (empty = unauthenticated).
    pub model_api_key: String,
    /// Vision-capable model used for document extraction.
    pub ocr_model: String,
    /// Text model used for drafting client notifications.
    pub notify_model: String,
    /// Firm name used in client-facing messages.
    pub firm_name: String,
    /// Bind address for the HTTP trigger surface.
    pub bind_addr: String,
    /// Largest document file the extraction workflow will download.
    pub max_file_size_mb: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            backend_base_url: var_or("TAXDESK_BACKEND_URL", "http://localhost:3001"),
            backend_token: var_or("TAXDESK_BACKEND_TOKEN", ""),
            model_base_url: var_or("TAXDESK_MODEL_URL", "http://localhost:8600"),
            model_api_key: var_or("TAXDESK_MODEL_API_KEY", ""),
            ocr_model: var_or("TAXDESK_OCR_MODEL", "vision-standard"),
            notify_model: var_or("TAXDESK_NOTIFY_MODEL", "chat-standard"),
            firm_name: var_or("TAXDESK_FIRM_NAME", "Beacon Tax Partners"),
            bind_addr: var_or("TAXDESK_BIND", "0.0.0.0:8080"),
            max_file_size_mb: var_or("TAXDESK_MAX_FILE_MB", "10").parse().unwrap_or(10),
        }
    }

    pub fn max_file_bytes(&self) -> usize {
        (self.max_file_size_mb as usize) * 1024 * 1024
    }
}

impl Default for Settings {
    fn default() -> Self {
        // Defaults without touching the environment, for tests.
        Self {
            backend_base_url: "http://localhost:3001".into(),
            backend_token: String::new(),
            model_base_url: "http://localhost:8600".into(),
            model_api_key: String::new(),
            ocr_model: "vision-standard".into(),
            notify_model: "chat-standard".into(),
            firm_name: "Beacon Tax Partners".into(),
            bind_addr: "0.0.0.0:8080".into(),
            max_file_size_mb: 10,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert!(settings.backend_base_url.starts_with("http://"));
        assert_eq!(settings.max_file_size_mb, 10);
        assert_eq!(settings.max_file_bytes(), 10 * 1024 * 1024);
        assert!(!settings.firm_name.is_empty());
    }

    #[test]
    fn version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
