// Configuration for the revdash client
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/revdash/config.toml)
// 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Named API endpoints, relative to the base URL
///
/// Every path can be overridden individually from the config file; the
/// defaults match the service's routing table.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth_status: String,
    pub csrf: String,
    pub login: String,
    pub signup: String,
    pub payment_status: String,
    pub validate_payment: String,
    pub update_payment: String,
    pub playstore_search: String,
    pub user_apps: String,
    pub dashboard: String,
    pub sentiment_analysis: String,
    pub feature_analysis: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth_status: "/api/auth/status/".to_string(),
            csrf: "/api/auth/csrf/".to_string(),
            login: "/api/auth/login/".to_string(),
            signup: "/api/auth/signup/".to_string(),
            payment_status: "/api/auth/payment-status/".to_string(),
            validate_payment: "/api/validate-payment/".to_string(),
            update_payment: "/api/auth/update-payment/".to_string(),
            playstore_search: "/api/playstore/search/".to_string(),
            user_apps: "/api/user/apps/".to_string(),
            dashboard: "/api/main/dashboard/".to_string(),
            sentiment_analysis: "/api/sentiment-analysis/".to_string(),
            feature_analysis: "/api/feature-analysis/".to_string(),
        }
    }
}

/// Log file rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl LogRotation {
    fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            LogRotation::Hourly => "hourly",
            LogRotation::Daily => "daily",
            LogRotation::Never => "never",
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Whether to also write logs to rotating files
    pub file_enabled: bool,

    /// Directory for log files
    pub file_dir: PathBuf,

    /// Log file name prefix
    pub file_prefix: String,

    /// Rotation policy for log files
    pub file_rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_prefix: "revdash".to_string(),
            file_rotation: LogRotation::Daily,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base origin of the analytics service
    pub base_url: String,

    /// Named endpoint paths under the base URL
    pub endpoints: Endpoints,

    /// Advisory request timeout in seconds (no retry on expiry)
    pub timeout_secs: u64,

    /// Directory holding the persisted selection store
    pub store_dir: PathBuf,

    /// Whether to enable the TUI (disabled = print session status and exit)
    pub enable_tui: bool,

    /// Demo mode: render sample data with the gate open, no network
    pub demo_mode: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Endpoint paths as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileEndpoints {
    auth_status: Option<String>,
    csrf: Option<String>,
    login: Option<String>,
    signup: Option<String>,
    payment_status: Option<String>,
    validate_payment: Option<String>,
    update_payment: Option<String>,
    playstore_search: Option<String>,
    user_apps: Option<String>,
    dashboard: Option<String>,
    sentiment_analysis: Option<String>,
    feature_analysis: Option<String>,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
    file_enabled: Option<bool>,
    file_dir: Option<String>,
    file_prefix: Option<String>,
    file_rotation: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    store_dir: Option<String>,

    /// Optional [endpoints] section
    endpoints: Option<FileEndpoints>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/revdash/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("revdash").join("config.toml"))
    }

    /// Default directory for the persisted selection store
    fn default_store_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("revdash")
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# revdash configuration
# Uncomment and modify options as needed

# Base origin of the analytics service (default: http://127.0.0.1:8000)
# base_url = "http://127.0.0.1:8000"

# Advisory request timeout in seconds (default: 30)
# timeout_secs = 30

# Directory for the persisted selection store (default: platform data dir)
# store_dir = "~/.local/share/revdash"

# Endpoint paths (defaults match the service's routing table)
# [endpoints]
# auth_status = "/api/auth/status/"
# csrf = "/api/auth/csrf/"
# login = "/api/auth/login/"
# signup = "/api/auth/signup/"
# payment_status = "/api/auth/payment-status/"
# validate_payment = "/api/validate-payment/"
# update_payment = "/api/auth/update-payment/"
# playstore_search = "/api/playstore/search/"
# user_apps = "/api/user/apps/"
# dashboard = "/api/main/dashboard/"
# sentiment_analysis = "/api/sentiment-analysis/"
# feature_analysis = "/api/feature-analysis/"

# Logging configuration
# [logging]
# level = "info"          # trace, debug, info, warn, error (RUST_LOG env var overrides this)
# file_enabled = false    # Also write logs to rotating files
# file_dir = "./logs"
# file_prefix = "revdash"
# file_rotation = "daily" # hourly, daily, never
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# revdash configuration

# Base origin of the analytics service
base_url = "{base_url}"

# Advisory request timeout in seconds
timeout_secs = {timeout}

# Directory for the persisted selection store
store_dir = "{store_dir}"

# Endpoint paths under the base URL
[endpoints]
auth_status = "{auth_status}"
csrf = "{csrf}"
login = "{login}"
signup = "{signup}"
payment_status = "{payment_status}"
validate_payment = "{validate_payment}"
update_payment = "{update_payment}"
playstore_search = "{playstore_search}"
user_apps = "{user_apps}"
dashboard = "{dashboard}"
sentiment_analysis = "{sentiment_analysis}"
feature_analysis = "{feature_analysis}"

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
file_enabled = {file_enabled}
file_dir = "{file_dir}"
file_prefix = "{file_prefix}"
file_rotation = "{file_rotation}"
"#,
            base_url = self.base_url,
            timeout = self.timeout_secs,
            store_dir = self.store_dir.display(),
            auth_status = self.endpoints.auth_status,
            csrf = self.endpoints.csrf,
            login = self.endpoints.login,
            signup = self.endpoints.signup,
            payment_status = self.endpoints.payment_status,
            validate_payment = self.endpoints.validate_payment,
            update_payment = self.endpoints.update_payment,
            playstore_search = self.endpoints.playstore_search,
            user_apps = self.endpoints.user_apps,
            dashboard = self.endpoints.dashboard,
            sentiment_analysis = self.endpoints.sentiment_analysis,
            feature_analysis = self.endpoints.feature_analysis,
            log_level = self.logging.level,
            file_enabled = self.logging.file_enabled,
            file_dir = self.logging.file_dir.display(),
            file_prefix = self.logging.file_prefix,
            file_rotation = self.logging.file_rotation.as_str(),
        )
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = Self::config_path() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config path",
            ));
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, self.to_toml())
    }

    /// Load configuration: file -> env vars -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Base URL: env > file > default
        let base_url = std::env::var("REVDASH_BASE_URL")
            .ok()
            .or(file.base_url)
            .unwrap_or_else(|| "http://127.0.0.1:8000".to_string());

        // Timeout: env > file > default
        let timeout_secs = std::env::var("REVDASH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(file.timeout_secs)
            .unwrap_or(30);

        // Store directory: env > file > default
        let store_dir = std::env::var("REVDASH_STORE_DIR")
            .ok()
            .or(file.store_dir)
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_store_dir);

        // TUI toggle: env only (runtime flag)
        let enable_tui = std::env::var("REVDASH_NO_TUI")
            .map(|v| v != "1" && v.to_lowercase() != "true")
            .unwrap_or(true);

        // Demo mode: env only (runtime flag)
        let demo_mode = std::env::var("REVDASH_DEMO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        // Endpoint paths: file config only (twelve env vars would be noise)
        let fe = file.endpoints.unwrap_or_default();
        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            auth_status: fe.auth_status.unwrap_or(defaults.auth_status),
            csrf: fe.csrf.unwrap_or(defaults.csrf),
            login: fe.login.unwrap_or(defaults.login),
            signup: fe.signup.unwrap_or(defaults.signup),
            payment_status: fe.payment_status.unwrap_or(defaults.payment_status),
            validate_payment: fe.validate_payment.unwrap_or(defaults.validate_payment),
            update_payment: fe.update_payment.unwrap_or(defaults.update_payment),
            playstore_search: fe.playstore_search.unwrap_or(defaults.playstore_search),
            user_apps: fe.user_apps.unwrap_or(defaults.user_apps),
            dashboard: fe.dashboard.unwrap_or(defaults.dashboard),
            sentiment_analysis: fe.sentiment_analysis.unwrap_or(defaults.sentiment_analysis),
            feature_analysis: fe.feature_analysis.unwrap_or(defaults.feature_analysis),
        };

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let fl = file.logging.unwrap_or_default();
        let log_defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            level: fl.level.unwrap_or(log_defaults.level),
            file_enabled: fl.file_enabled.unwrap_or(log_defaults.file_enabled),
            file_dir: fl
                .file_dir
                .map(PathBuf::from)
                .unwrap_or(log_defaults.file_dir),
            file_prefix: fl.file_prefix.unwrap_or(log_defaults.file_prefix),
            file_rotation: fl
                .file_rotation
                .map(|s| LogRotation::parse(&s))
                .unwrap_or(log_defaults.file_rotation),
        };

        Self {
            base_url,
            endpoints,
            timeout_secs,
            store_dir,
            enable_tui,
            demo_mode,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            endpoints: Endpoints::default(),
            timeout_secs: 30,
            store_dir: Self::default_store_dir(),
            enable_tui: true,
            demo_mode: false,
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify that serialized config can be parsed back.
    /// This catches TOML syntax errors in the to_toml template.
    #[test]
    fn config_roundtrip_default() {
        let config = Config::default();
        let toml_str = config.to_toml();

        let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
        assert!(
            parsed.is_ok(),
            "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
            toml_str,
            parsed.err()
        );
    }

    /// Every endpoint key in the template must survive the round trip,
    /// otherwise a user edit to that key would be silently ignored.
    #[test]
    fn config_roundtrip_preserves_endpoints() {
        let mut config = Config::default();
        config.endpoints.dashboard = "/api/v2/dashboard/".to_string();
        config.endpoints.playstore_search = "/api/v2/search/".to_string();

        let parsed: FileConfig = toml::from_str(&config.to_toml()).unwrap();
        let endpoints = parsed.endpoints.expect("endpoints section present");
        assert_eq!(endpoints.dashboard.as_deref(), Some("/api/v2/dashboard/"));
        assert_eq!(
            endpoints.playstore_search.as_deref(),
            Some("/api/v2/search/")
        );
    }

    #[test]
    fn log_rotation_parse_is_lenient() {
        assert_eq!(LogRotation::parse("hourly"), LogRotation::Hourly);
        assert_eq!(LogRotation::parse("NEVER"), LogRotation::Never);
        // Unknown values fall back to daily rather than failing startup
        assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
    }
}
