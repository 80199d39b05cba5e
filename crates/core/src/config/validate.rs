use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Scryfall base URL is set and timeout is not 0
/// - Import feed type is set, batch size and timeout are not 0
/// - Search default limit fits under the max limit
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scryfall.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "scryfall.base_url cannot be empty".to_string(),
        ));
    }
    if config.scryfall.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scryfall.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.import.feed_type.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "import.feed_type cannot be empty".to_string(),
        ));
    }
    if config.import.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "import.batch_size cannot be 0".to_string(),
        ));
    }
    if config.import.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "import.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.search.max_limit == 0 || config.search.identify_limit == 0 {
        return Err(ConfigError::ValidationError(
            "search limits cannot be 0".to_string(),
        ));
    }
    if config.search.default_limit > config.search.max_limit {
        return Err(ConfigError::ValidationError(format!(
            "search.default_limit ({}) exceeds search.max_limit ({})",
            config.search.default_limit, config.search.max_limit
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_batch_size_fails() {
        let mut config = Config::default();
        config.import.batch_size = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_empty_base_url_fails() {
        let mut config = Config::default();
        config.scryfall.base_url = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_import_timeout_fails() {
        let mut config = Config::default();
        config.import.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_default_limit_above_max_fails() {
        let mut config = Config::default();
        config.search.default_limit = 200;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("search.default_limit"));
    }
}
