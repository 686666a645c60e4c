//! Forecast hyperparameter configuration with environment overrides.

use std::env;

/// Hyperparameters for the forecast model and its trainer.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Consecutive historical samples fed to the model per inference.
    pub timesteps: usize,
    /// Numeric measurements per sample.
    pub features: usize,
    /// Hidden state width of each recurrent layer.
    pub hidden_units: usize,
    /// Dropout rate applied between the two recurrent layers during training.
    pub dropout: f64,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Fraction of training examples held out for validation.
    pub validation_split: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            timesteps: 10,
            features: 5,
            hidden_units: 32,
            dropout: 0.2,
            learning_rate: 0.001,
            batch_size: 32,
            validation_split: 0.2,
        }
    }
}

impl ForecastConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timesteps: parse_env("FORECAST_TIMESTEPS", defaults.timesteps),
            features: defaults.features,
            hidden_units: parse_env("FORECAST_HIDDEN_UNITS", defaults.hidden_units),
            dropout: parse_env("FORECAST_DROPOUT", defaults.dropout),
            learning_rate: parse_env("FORECAST_LEARNING_RATE", defaults.learning_rate),
            batch_size: parse_env("FORECAST_BATCH_SIZE", defaults.batch_size),
            validation_split: parse_env("FORECAST_VALIDATION_SPLIT", defaults.validation_split),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.timesteps, 10);
        assert_eq!(config.features, 5);
        assert_eq!(config.batch_size, 32);
        assert!((config.dropout - 0.2).abs() < f64::EPSILON);
        assert!((config.learning_rate - 0.001).abs() < f64::EPSILON);
        assert!((config.validation_split - 0.2).abs() < f64::EPSILON);
    }
}
