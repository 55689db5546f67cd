use std::path::PathBuf;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Transient clone working copies live here.
    pub repo_dir: PathBuf,
    /// Downloads and produced archives land here; served under `/files`.
    pub archive_dir: PathBuf,
    pub verify_url: String,
    pub verify_secret: String,
}

impl Config {
    pub fn from_env() -> Self {
        let base = std::env::var("FETCHGATE_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs_next::home_dir().unwrap_or_else(|| PathBuf::from(".")));

        Self {
            host: std::env::var("FETCHGATE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("FETCHGATE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            repo_dir: base.join("repos"),
            archive_dir: base.join("archives"),
            verify_url: std::env::var("FETCHGATE_VERIFY_URL").unwrap_or_else(|_| {
                "https://www.recaptcha.net/recaptcha/api/siteverify".to_string()
            }),
            verify_secret: std::env::var("FETCHGATE_VERIFY_SECRET").unwrap_or_default(),
        }
    }
}
