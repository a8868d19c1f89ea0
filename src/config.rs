use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the clinic scheduler
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Audit trail persistence settings
    pub audit: AuditConfig,
    /// Fire-and-forget diagnostics hook
    pub diagnostics: DiagnosticsConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Base URL of the audit record persistence API
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client
    pub timeout_seconds: u64,
    /// Uniqueness checks before an unverified key is accepted
    pub key_attempts: u32,
    /// Outbound rate limiting
    pub rate_limit: RateLimitConfig,
    /// Cache of successful record lookups
    pub lookup_cache: LookupCacheConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LookupCacheConfig {
    pub max_capacity: u64,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DiagnosticsConfig {
    /// Send diagnostic events at all
    pub enabled: bool,
    /// GET endpoint receiving events as query parameters
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON instead of human-readable logs
    pub json_logs: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            audit: AuditConfig {
                base_url: "https://api.urogy.in".to_string(),
                timeout_seconds: 10,
                key_attempts: crate::audit::DEFAULT_MAX_ATTEMPTS,
                rate_limit: RateLimitConfig {
                    requests_per_second: 10,
                    burst_capacity: 20,
                },
                lookup_cache: LookupCacheConfig {
                    max_capacity: 1000,
                    ttl_seconds: 300, // 5 minutes
                },
            },
            diagnostics: DiagnosticsConfig {
                enabled: false,
                endpoint: None,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (clinic-scheduler.toml, .clinic-scheduler-rc)
    /// 3. Environment variables (prefixed with CLINIC_SCHEDULER__)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&SchedulerConfig::default())?);

        if Path::new("clinic-scheduler.toml").exists() {
            builder = builder.add_source(File::with_name("clinic-scheduler"));
        }

        if Path::new(".clinic-scheduler-rc").exists() {
            builder = builder.add_source(
                File::with_name(".clinic-scheduler-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("CLINIC_SCHEDULER")
                .separator("__")
                .try_parsing(true),
        );

        let scheduler_config: SchedulerConfig = builder.build()?.try_deserialize()?;
        scheduler_config.validate()?;
        Ok(scheduler_config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audit.base_url.trim().is_empty() {
            anyhow::bail!("audit.base_url must not be empty");
        }
        if self.audit.rate_limit.requests_per_second == 0 {
            anyhow::bail!("audit.rate_limit.requests_per_second must be at least 1");
        }
        if self.diagnostics.enabled && self.diagnostics.endpoint.is_none() {
            anyhow::bail!("diagnostics.endpoint is required when diagnostics are enabled");
        }
        Ok(())
    }

    /// Diagnostics endpoint, if events should actually be sent
    pub fn diagnostics_endpoint(&self) -> Option<String> {
        if self.diagnostics.enabled {
            self.diagnostics.endpoint.clone()
        } else {
            None
        }
    }

    /// Render as the TOML accepted by `clinic-scheduler.toml`
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load .env file if it exists. Returns whether one was loaded.
    ///
    /// Must run before the first `config()` call for its variables to apply.
    pub fn load_env_file() -> Result<bool> {
        if !Path::new(".env").exists() {
            return Ok(false);
        }
        dotenvy::dotenv()?;
        Ok(true)
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<SchedulerConfig, anyhow::Error>> =
    std::sync::LazyLock::new(SchedulerConfig::load);

/// Get the global configuration
pub fn config() -> Result<&'static SchedulerConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = SchedulerConfig::default();
        assert!(defaults.validate().is_ok());
        assert_eq!(defaults.audit.key_attempts, 10);
        assert_eq!(defaults.diagnostics_endpoint(), None);
    }

    #[test]
    fn test_diagnostics_require_endpoint() {
        let mut settings = SchedulerConfig::default();
        settings.diagnostics.enabled = true;
        assert!(settings.validate().is_err());

        settings.diagnostics.endpoint = Some("https://example.test/log".to_string());
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.diagnostics_endpoint().as_deref(),
            Some("https://example.test/log")
        );
    }

    #[test]
    fn test_save_to_file_writes_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic-scheduler.toml");

        let mut settings = SchedulerConfig::default();
        settings.audit.base_url = "http://localhost:8080".to_string();
        settings.save_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("base_url = \"http://localhost:8080\""));
        assert!(written.contains("[audit.rate_limit]"));
    }

    #[test]
    fn test_toml_round_trip() {
        let defaults = SchedulerConfig::default();
        let text = defaults.to_toml().unwrap();
        let parsed: SchedulerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, defaults);
    }
}
