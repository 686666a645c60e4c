use chainforecast::application::forecast::PricePredictor;
use chainforecast::config::ForecastConfig;
use chainforecast::domain::errors::ForecastError;
use chainforecast::domain::telemetry::{NetworkSample, Trend};

fn sample(price: f64, index: usize) -> NetworkSample {
    NetworkSample {
        btc_price: price,
        mempool_size: 15_000.0 + index as f64 * 25.0,
        hashrate: 6.0e20 + index as f64 * 1.0e17,
        exchange_inflows: 300.0 + index as f64,
        timestamp: 1_700_000_000.0 + index as f64 * 60.0,
    }
}

fn history(prices: &[f64]) -> Vec<NetworkSample> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| sample(p, i))
        .collect()
}

#[test]
fn predict_succeeds_on_exactly_timesteps_samples() {
    let predictor = PricePredictor::new(ForecastConfig::default());
    let prices: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
    assert!(predictor.predict(&history(&prices)).is_ok());
}

#[test]
fn predict_rejects_one_sample_short_of_window() {
    let predictor = PricePredictor::new(ForecastConfig::default());
    let prices: Vec<f64> = (0..9).map(|i| 100.0 + i as f64).collect();

    let err = predictor.predict(&history(&prices)).unwrap_err();
    assert!(matches!(
        err,
        ForecastError::InsufficientData { need: 10, got: 9 }
    ));
}

#[test]
fn constant_prices_give_stable_trend_and_full_confidence() {
    let predictor = PricePredictor::new(ForecastConfig::default());
    let prediction = predictor.predict(&history(&[100.0; 12])).unwrap();

    assert_eq!(prediction.trend, Trend::Stable);
    assert_eq!(prediction.volatility, 0.0);
    assert_eq!(prediction.confidence, 1.0);
    assert_eq!(prediction.predicted_price, 100.0);
}

#[test]
fn five_percent_jump_gives_up_trend_with_fixed_step() {
    let predictor = PricePredictor::new(ForecastConfig::default());
    let mut prices = vec![100.0; 10];
    prices.push(105.0);

    let prediction = predictor.predict(&history(&prices)).unwrap();
    assert_eq!(prediction.trend, Trend::Up);
    assert!((prediction.predicted_price - 106.05).abs() < 1e-9);
}

#[test]
fn documented_scenario_eleven_samples() {
    // 10 samples at 100 then one at 105, timesteps = 10: trend Up,
    // predicted 106.05, volatility over all 11 prices, confidence
    // clamp(1 - 2*vol, 0, 1).
    let predictor = PricePredictor::new(ForecastConfig::default());
    let mut prices = vec![100.0; 10];
    prices.push(105.0);

    let prediction = predictor.predict(&history(&prices)).unwrap();
    assert_eq!(prediction.trend, Trend::Up);
    assert!((prediction.predicted_price - 106.05).abs() < 1e-9);
    assert!((prediction.volatility - 0.015).abs() < 1e-12);
    assert!((prediction.confidence - 0.97).abs() < 1e-12);
}

#[test]
fn sharp_drop_gives_down_trend() {
    let predictor = PricePredictor::new(ForecastConfig::default());
    let mut prices = vec![100.0; 10];
    prices.push(90.0);

    let prediction = predictor.predict(&history(&prices)).unwrap();
    assert_eq!(prediction.trend, Trend::Down);
    assert!((prediction.predicted_price - 90.0 * 0.99).abs() < 1e-9);
}

#[test]
fn predicted_price_is_independent_of_model_parameters() {
    // The forward pass runs but its output does not drive the price:
    // two predictors with different random weights must agree exactly.
    let mut prices = vec![100.0; 10];
    prices.push(105.0);
    let history = history(&prices);

    let a = PricePredictor::new(ForecastConfig::default())
        .predict(&history)
        .unwrap();
    let b = PricePredictor::new(ForecastConfig::default())
        .predict(&history)
        .unwrap();

    assert_eq!(a.predicted_price, b.predicted_price);
    assert_eq!(a.trend, b.trend);
    assert_eq!(a.confidence, b.confidence);
}

#[test]
fn identical_samples_fail_normalization_not_nan() {
    // Every feature of every row equal: zero global range.
    let predictor = PricePredictor::new(ForecastConfig::default());
    let flat = vec![
        NetworkSample {
            btc_price: 1.0,
            mempool_size: 1.0,
            hashrate: 1.0,
            exchange_inflows: 1.0,
            timestamp: 1.0,
        };
        10
    ];

    let err = predictor.predict(&flat).unwrap_err();
    assert!(matches!(err, ForecastError::Domain { .. }));
}

#[test]
fn volatile_history_lowers_confidence() {
    let predictor = PricePredictor::new(ForecastConfig::default());
    let prices = [
        100.0, 140.0, 80.0, 150.0, 70.0, 160.0, 60.0, 170.0, 50.0, 180.0,
    ];

    let prediction = predictor.predict(&history(&prices)).unwrap();
    assert!(prediction.volatility > 0.5);
    assert_eq!(prediction.confidence, 0.0); // clamped at the floor
}
