use crate::config::types::{Config, PathConfigEntry};
use crate::rules::RuleTable;
use crate::url::normalize;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};

/// Upper bound on concurrent workers
const MAX_THREADS: usize = 256;

/// Validates the entire configuration
///
/// Every error here is fatal: it is reported before any page is fetched.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_base_url(config)?;
    validate_limits(config)?;
    validate_headers(config)?;
    validate_allowed_domains(&config.allowed_domains)?;
    validate_path_configs(&config.path_configs)?;
    Ok(())
}

fn validate_base_url(config: &Config) -> Result<(), ConfigError> {
    normalize(&config.url, None, config.normalize_options())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base url '{}': {}", config.url, e)))?;
    Ok(())
}

fn validate_limits(config: &Config) -> Result<(), ConfigError> {
    if config.num_threads < 1 || config.num_threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "num_threads must be between 1 and {}, got {}",
            MAX_THREADS, config.num_threads
        )));
    }

    if !config.throttle.is_finite() || config.throttle < 0.0 {
        return Err(ConfigError::Validation(format!(
            "throttle must be a non-negative number of seconds, got {}",
            config.throttle
        )));
    }

    if !config.timeout.is_finite() || config.timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "timeout must be a positive number of seconds, got {}",
            config.timeout
        )));
    }

    if config.max_children_per_page == Some(0) {
        return Err(ConfigError::Validation(
            "max_children_per_page must be >= 1 when set".to_string(),
        ));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_headers(config: &Config) -> Result<(), ConfigError> {
    for (name, value) in config.headers.iter().chain(config.cookies.iter()) {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header or cookie name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header or cookie '{}'", name))
        })?;
    }
    Ok(())
}

fn validate_allowed_domains(domains: &[String]) -> Result<(), ConfigError> {
    for pattern in domains {
        let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
        validate_domain_string(domain)?;
    }
    Ok(())
}

/// Validates a host name (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']) || domain.contains("..") {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    Ok(())
}

fn validate_path_configs(entries: &[PathConfigEntry]) -> Result<(), ConfigError> {
    for (index, entry) in entries.iter().enumerate() {
        let prefix = entry.path_prefix.as_deref().map(str::trim).unwrap_or("");
        if prefix.is_empty() {
            return Err(ConfigError::Validation(format!(
                "path_configs[{}] ({}) is missing path_prefix",
                index,
                if entry.description.is_empty() {
                    "unnamed"
                } else {
                    entry.description.as_str()
                }
            )));
        }
    }

    // Compiles every selector and pattern; the table itself is rebuilt by the crawler
    RuleTable::from_entries(entries)?;
    Ok(())
}
