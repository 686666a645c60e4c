//! Training loop for the forecast model.
//!
//! `fit` mutates the model in place. The caller owns write exclusivity; a
//! concurrent reader racing a fit can observe partially updated parameters,
//! so the predictor wraps the model in a lock. Cancellation is cooperative
//! and checked between epochs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array1, Array2, s};
use tracing::debug;

use crate::application::forecast::model::ForecastModel;
use crate::application::forecast::optimizer::Adam;
use crate::application::preprocessing::{normalize_global, training_rows};
use crate::config::ForecastConfig;
use crate::domain::errors::ForecastError;
use crate::domain::telemetry::TrainingExample;

/// Progress signal emitted once per completed epoch.
#[derive(Debug, Clone)]
pub struct EpochReport {
    /// 1-based epoch index.
    pub epoch: usize,
    pub epochs: usize,
    /// Mean squared error over the training portion.
    pub loss: f64,
    /// Mean absolute error over the training portion.
    pub mae: f64,
    /// Mean squared error over the held-out tail, when one exists.
    pub val_loss: Option<f64>,
}

/// Shared flag for cooperatively stopping a long-running fit.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub epochs_run: usize,
    pub loss_history: Vec<f64>,
    /// True when the token stopped the loop before all epochs ran.
    pub cancelled: bool,
}

/// Fits the model against historical (window -> target) pairs.
///
/// Inputs and targets are min/max normalized over their respective whole
/// batches, inputs are reshaped through the padded single-feature training
/// path, and the head is stepped with Adam against MSE loss in batches of
/// `config.batch_size` with a time-ordered validation split.
///
/// On any failure the model is restored to its pre-call parameters, so a
/// diverging run never corrupts a previously good model.
pub fn fit(
    model: &mut ForecastModel,
    examples: &[TrainingExample],
    epochs: usize,
    config: &ForecastConfig,
    cancel: &CancelToken,
    on_epoch: impl FnMut(&EpochReport),
) -> Result<TrainOutcome, ForecastError> {
    let snapshot = model.clone();
    match run(model, examples, epochs, config, cancel, on_epoch) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            *model = snapshot;
            Err(err)
        }
    }
}

fn run(
    model: &mut ForecastModel,
    examples: &[TrainingExample],
    epochs: usize,
    config: &ForecastConfig,
    cancel: &CancelToken,
    mut on_epoch: impl FnMut(&EpochReport),
) -> Result<TrainOutcome, ForecastError> {
    let (inputs, outputs) = split_examples(examples)?;

    let inputs = normalize_global(&inputs)?;
    let outputs = normalize_global(&outputs)?;
    let targets: Vec<f64> = outputs.column(0).to_vec();

    let tensor = training_rows(&inputs, model.timesteps, model.features);

    let n = examples.len();
    let val_n = (n as f64 * config.validation_split).floor() as usize;
    let train_n = n - val_n;
    if train_n == 0 {
        return Err(ForecastError::InsufficientData { need: 1, got: 0 });
    }

    let mut adam = Adam::new(config.learning_rate);
    let mut rng = rand::rng();
    let mut loss_history = Vec::with_capacity(epochs);
    let mut cancelled = false;
    let mut epochs_run = 0;

    for epoch in 1..=epochs {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let mut sq_err_sum = 0.0;
        let mut abs_err_sum = 0.0;

        for start in (0..train_n).step_by(config.batch_size) {
            let end = (start + config.batch_size).min(train_n);
            let batch = (end - start) as f64;
            let mask = model.dropout_mask(&mut rng);

            let mut grad_weights = Array1::zeros(model.hidden_units);
            let mut grad_bias = 0.0;

            for i in start..end {
                let hidden = model.encode(tensor.slice(s![i, .., ..]), mask.as_ref());
                let error = model.output(&hidden) - targets[i];

                sq_err_sum += error * error;
                abs_err_sum += error.abs();
                grad_weights += &(hidden * (2.0 * error));
                grad_bias += 2.0 * error;
            }

            grad_weights /= batch;
            grad_bias /= batch;

            let dw = adam.step("head.weights", &grad_weights);
            model.head_weights = &model.head_weights - &dw;
            let db = adam.step("head.bias", &Array1::from_elem(1, grad_bias));
            model.head_bias -= db[0];
        }

        let loss = sq_err_sum / train_n as f64;
        let mae = abs_err_sum / train_n as f64;
        let val_loss = if val_n > 0 {
            let mut sum = 0.0;
            for i in train_n..n {
                let pred = model.forward(tensor.slice(s![i, .., ..]));
                sum += (pred - targets[i]).powi(2);
            }
            Some(sum / val_n as f64)
        } else {
            None
        };

        if !loss.is_finite() || val_loss.is_some_and(|v| !v.is_finite()) {
            return Err(ForecastError::Training {
                epoch,
                reason: "non-finite loss".to_string(),
            });
        }

        debug!(epoch, loss, mae, ?val_loss, "training epoch complete");
        loss_history.push(loss);
        epochs_run = epoch;
        on_epoch(&EpochReport {
            epoch,
            epochs,
            loss,
            mae,
            val_loss,
        });
    }

    Ok(TrainOutcome {
        epochs_run,
        loss_history,
        cancelled,
    })
}

/// Splits examples into parallel input/output arrays, validating that every
/// input carries the same fixed length.
fn split_examples(
    examples: &[TrainingExample],
) -> Result<(Array2<f64>, Array2<f64>), ForecastError> {
    if examples.is_empty() {
        return Err(ForecastError::InsufficientData { need: 1, got: 0 });
    }
    let len = examples[0].input.len();
    if len == 0 {
        return Err(ForecastError::domain("training inputs are empty"));
    }

    let mut inputs = Array2::zeros((examples.len(), len));
    let mut outputs = Array2::zeros((examples.len(), 1));
    for (i, example) in examples.iter().enumerate() {
        if example.input.len() != len {
            return Err(ForecastError::domain(format!(
                "ragged training input at index {i}: expected length {len}, got {}",
                example.input.len()
            )));
        }
        for (j, &x) in example.input.iter().enumerate() {
            inputs[[i, j]] = x;
        }
        outputs[[i, 0]] = example.output;
    }
    Ok((inputs, outputs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(n: usize) -> Vec<TrainingExample> {
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64;
                TrainingExample {
                    input: (0..10).map(|t| base + t as f64 * 0.5).collect(),
                    output: base + 5.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_fit_reports_every_epoch() {
        let config = ForecastConfig::default();
        let mut model = ForecastModel::new(&config);
        let mut reports = Vec::new();

        let outcome = fit(
            &mut model,
            &examples(50),
            4,
            &config,
            &CancelToken::new(),
            |r| reports.push(r.clone()),
        )
        .unwrap();

        assert_eq!(outcome.epochs_run, 4);
        assert_eq!(outcome.loss_history.len(), 4);
        assert!(!outcome.cancelled);
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].epoch, 1);
        assert!(reports.iter().all(|r| r.loss.is_finite() && r.loss >= 0.0));
        assert!(reports.iter().all(|r| r.val_loss.is_some()));
    }

    #[test]
    fn test_fit_mutates_head_in_place() {
        let config = ForecastConfig::default();
        let mut model = ForecastModel::new(&config);
        let before = model.head_weights.clone();

        fit(
            &mut model,
            &examples(40),
            2,
            &config,
            &CancelToken::new(),
            |_| {},
        )
        .unwrap();

        assert_ne!(before, model.head_weights);
    }

    #[test]
    fn test_pre_cancelled_token_runs_no_epochs() {
        let config = ForecastConfig::default();
        let mut model = ForecastModel::new(&config);
        let token = CancelToken::new();
        token.cancel();

        let outcome = fit(&mut model, &examples(40), 10, &config, &token, |_| {}).unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.epochs_run, 0);
    }

    #[test]
    fn test_empty_examples_rejected() {
        let config = ForecastConfig::default();
        let mut model = ForecastModel::new(&config);
        let err = fit(&mut model, &[], 1, &config, &CancelToken::new(), |_| {}).unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }

    #[test]
    fn test_ragged_inputs_rejected_and_model_restored() {
        let config = ForecastConfig::default();
        let mut model = ForecastModel::new(&config);
        let before = model.head_weights.clone();

        let mut bad = examples(20);
        bad[7].input.truncate(3);

        let err = fit(&mut model, &bad, 1, &config, &CancelToken::new(), |_| {}).unwrap_err();
        assert!(matches!(err, ForecastError::Domain { .. }));
        assert_eq!(before, model.head_weights);
    }

    #[test]
    fn test_constant_targets_fail_normalization() {
        let config = ForecastConfig::default();
        let mut model = ForecastModel::new(&config);
        let flat: Vec<TrainingExample> = (0..20)
            .map(|i| TrainingExample {
                input: vec![i as f64; 10],
                output: 42.0,
            })
            .collect();

        let err = fit(&mut model, &flat, 1, &config, &CancelToken::new(), |_| {}).unwrap_err();
        assert!(matches!(err, ForecastError::Domain { .. }));
    }
}
