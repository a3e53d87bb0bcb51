//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.normalize.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "normalize.max_dimension must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.normalize.quality) {
            return Err(ConfigError::ValidationError(
                "normalize.quality must be between 1 and 100".into(),
            ));
        }
        if self.normalize.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "normalize.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.plantnet.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "plantnet.timeout_ms must be > 0".into(),
            ));
        }
        if !self.boost.threshold.is_finite()
            || self.boost.threshold < 0.0
            || self.boost.threshold > 1.0
        {
            return Err(ConfigError::ValidationError(
                "boost.threshold must be between 0.0 and 1.0".into(),
            ));
        }
        if self.boost.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "boost.max_tokens must be > 0".into(),
            ));
        }
        if self.boost.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "boost.parallel must be > 0".into(),
            ));
        }
        if self.boost.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "boost.timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_parallel() {
        let mut config = Config::default();
        config.boost.parallel = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("boost.parallel"));
    }

    #[test]
    fn test_validate_rejects_zero_max_dimension() {
        let mut config = Config::default();
        config.normalize.max_dimension = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_dimension"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.normalize.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn test_validate_rejects_invalid_threshold() {
        let mut config = Config::default();
        config.boost.threshold = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));

        config.boost.threshold = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }
}
