//! Return-series volatility.

use statrs::statistics::Statistics;

use crate::domain::errors::ForecastError;

/// Population standard deviation of simple returns over `prices`.
///
/// Returns exactly 0.0 for a constant series. Requires at least two prices.
pub fn realized_volatility(prices: &[f64]) -> Result<f64, ForecastError> {
    if prices.len() < 2 {
        return Err(ForecastError::InsufficientData {
            need: 2,
            got: prices.len(),
        });
    }

    let mut returns = Vec::with_capacity(prices.len() - 1);
    for window in prices.windows(2) {
        let (prev, next) = (window[0], window[1]);
        let r = (next - prev) / prev;
        if !r.is_finite() {
            return Err(ForecastError::domain(format!(
                "non-finite return from price pair ({prev}, {next})"
            )));
        }
        returns.push(r);
    }

    Ok(returns.iter().copied().population_std_dev())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_has_zero_volatility() {
        let prices = vec![100.0; 8];
        assert_eq!(realized_volatility(&prices).unwrap(), 0.0);
    }

    #[test]
    fn test_volatility_is_non_negative() {
        let prices = vec![100.0, 95.0, 103.0, 99.5, 110.0];
        assert!(realized_volatility(&prices).unwrap() > 0.0);
    }

    #[test]
    fn test_known_population_std_dev() {
        // Nine flat steps then a 5% jump: returns are nine 0s and one 0.05.
        let mut prices = vec![100.0; 10];
        prices.push(105.0);
        let vol = realized_volatility(&prices).unwrap();
        assert!((vol - 0.015).abs() < 1e-12);
    }

    #[test]
    fn test_too_short_series_rejected() {
        let err = realized_volatility(&[100.0]).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData { need: 2, got: 1 }
        ));
    }

    #[test]
    fn test_zero_price_rejected() {
        assert!(realized_volatility(&[0.0, 100.0]).is_err());
    }
}
