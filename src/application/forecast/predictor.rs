//! Prediction orchestration.
//!
//! `PricePredictor` is the explicit handle around the shared model: reads
//! (`predict`) take a read lock, training takes the write lock, giving the
//! single-writer/multiple-reader discipline the model requires. Multiple
//! independent predictors can coexist, each with its own parameters.

use std::sync::{Arc, RwLock};

use ndarray::{Array2, aview1, s};
use tracing::trace;

use crate::application::forecast::model::ForecastModel;
use crate::application::forecast::trainer::{self, CancelToken, EpochReport, TrainOutcome};
use crate::application::preprocessing::{inference_window, normalize_global, realized_volatility};
use crate::config::ForecastConfig;
use crate::domain::errors::ForecastError;
use crate::domain::telemetry::{FEATURE_COUNT, NetworkSample, Prediction, Trend, TrainingExample};

/// Fractional price move (of the latest price) separating Up/Down from Stable.
const TREND_THRESHOLD: f64 = 0.01;
/// Fixed per-step price delta applied for a directional trend.
const PRICE_STEP: f64 = 0.01;

pub struct PricePredictor {
    config: ForecastConfig,
    model: Arc<RwLock<ForecastModel>>,
}

impl PricePredictor {
    /// Creates a predictor with a freshly initialized model.
    pub fn new(config: ForecastConfig) -> Self {
        let model = ForecastModel::new(&config);
        Self::with_model(config, model)
    }

    pub fn with_model(config: ForecastConfig, model: ForecastModel) -> Self {
        Self {
            config,
            model: Arc::new(RwLock::new(model)),
        }
    }

    /// Produces a forecast from an ordered telemetry history.
    ///
    /// Requires at least `timesteps` samples. Pure with respect to the
    /// inputs and the current parameters; the normalization range is
    /// recomputed from this history alone.
    pub fn predict(&self, history: &[NetworkSample]) -> Result<Prediction, ForecastError> {
        let model = self
            .model
            .read()
            .map_err(|_| ForecastError::domain("model lock poisoned"))?;

        let n = history.len();
        if n < model.timesteps {
            return Err(ForecastError::InsufficientData {
                need: model.timesteps,
                got: n,
            });
        }

        let mut rows = Array2::zeros((n, FEATURE_COUNT));
        for (i, sample) in history.iter().enumerate() {
            rows.row_mut(i).assign(&aview1(&sample.features()));
        }
        let normalized = normalize_global(&rows)?;
        let window = inference_window(&normalized, model.timesteps)?;

        // The forward pass output is not wired into the predicted price;
        // the fixed ±1% heuristic below is the observed product behavior.
        let raw = model.forward(window.slice(s![0, .., ..]));
        trace!(raw_model_output = raw, "forward pass complete");

        let prices: Vec<f64> = history.iter().map(|s| s.btc_price).collect();
        let volatility = realized_volatility(&prices)?;

        let last = prices[n - 1];
        let trend = classify_trend(prices[n - 2], last);
        let delta = match trend {
            Trend::Up => PRICE_STEP,
            Trend::Down => -PRICE_STEP,
            Trend::Stable => 0.0,
        };

        Ok(Prediction {
            predicted_price: last * (1.0 + delta),
            confidence: (1.0 - 2.0 * volatility).clamp(0.0, 1.0),
            trend,
            volatility,
        })
    }

    /// Trains the shared model in place, holding the write lock for the
    /// duration of the fit. Long-running; run it off any latency-critical
    /// path and cancel via the token between epochs.
    pub fn fit(
        &self,
        examples: &[TrainingExample],
        epochs: usize,
        cancel: &CancelToken,
        on_epoch: impl FnMut(&EpochReport),
    ) -> Result<TrainOutcome, ForecastError> {
        let mut model = self
            .model
            .write()
            .map_err(|_| ForecastError::domain("model lock poisoned"))?;
        trainer::fit(&mut model, examples, epochs, &self.config, cancel, on_epoch)
    }

    /// Runs `f` against the current parameters under the read lock.
    pub fn with_parameters<T>(&self, f: impl FnOnce(&ForecastModel) -> T) -> Result<T, ForecastError> {
        let model = self
            .model
            .read()
            .map_err(|_| ForecastError::domain("model lock poisoned"))?;
        Ok(f(&model))
    }

    /// Replaces the current parameters (e.g. after a store load).
    pub fn install_model(&self, model: ForecastModel) -> Result<(), ForecastError> {
        let mut slot = self
            .model
            .write()
            .map_err(|_| ForecastError::domain("model lock poisoned"))?;
        *slot = model;
        Ok(())
    }
}

/// Up when the rise exceeds 1% of the latest price, Down when the fall
/// does, Stable otherwise.
fn classify_trend(prev: f64, last: f64) -> Trend {
    let change = last - prev;
    let threshold = TREND_THRESHOLD * last;
    if change > threshold {
        Trend::Up
    } else if change < -threshold {
        Trend::Down
    } else {
        Trend::Stable
    }
}
