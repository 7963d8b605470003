use std::time::Duration;

/// Connection settings for the two HTTP surfaces. Read once at startup.
/// Missing or malformed values fall back to the defaults below.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend_url: String,
    pub backend_token: String,
    pub mail_url: String,
    pub http_timeout: Duration,
    pub page_size: u32,
    pub attachment_limit_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            backend_token: String::new(),
            mail_url: "http://localhost:8100".to_string(),
            http_timeout: Duration::from_secs(30),
            page_size: 50,
            attachment_limit_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl SessionConfig {
    /// Load from the environment, honoring a `.env` file in dev.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        if let Ok(v) = std::env::var("VETDESK_BACKEND_URL") {
            config.backend_url = v;
        }
        if let Ok(v) = std::env::var("VETDESK_BACKEND_TOKEN") {
            config.backend_token = v;
        }
        if let Ok(v) = std::env::var("VETDESK_MAIL_URL") {
            config.mail_url = v;
        }
        if let Some(secs) = std::env::var("VETDESK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = std::env::var("VETDESK_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.page_size = size;
        }
        if let Some(limit) = std::env::var("VETDESK_ATTACHMENT_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.attachment_limit_bytes = limit;
        }
        config
    }
}
