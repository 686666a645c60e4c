//! Stacked recurrent forecast model.
//!
//! Architecture is fixed: a first LSTM layer whose hidden sequence feeds a
//! second LSTM layer timestep by timestep, inverted dropout between them
//! during training, and a single linear output unit reading the second
//! layer's final hidden state. Inference applies no dropout and is fully
//! deterministic for a given parameter set.

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, s};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;

/// One LSTM layer. Weight layout follows the usual four-gate split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmCell {
    input_size: usize,
    hidden_size: usize,

    // Input gate
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,
    // Forget gate
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,
    // Cell candidate
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,
    // Output gate
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

impl LstmCell {
    fn new(input_size: usize, hidden_size: usize, rng: &mut impl Rng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let mut uniform = |rows: usize, cols: usize| {
            Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..limit))
        };

        Self {
            input_size,
            hidden_size,
            w_ii: uniform(hidden_size, input_size),
            w_hi: uniform(hidden_size, hidden_size),
            b_i: Array1::zeros(hidden_size),
            w_if: uniform(hidden_size, input_size),
            w_hf: uniform(hidden_size, hidden_size),
            // Forget bias starts at 1.0 so early training does not erase state.
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_ig: uniform(hidden_size, input_size),
            w_hg: uniform(hidden_size, hidden_size),
            b_g: Array1::zeros(hidden_size),
            w_io: uniform(hidden_size, input_size),
            w_ho: uniform(hidden_size, hidden_size),
            b_o: Array1::zeros(hidden_size),
        }
    }

    fn init_state(&self) -> (Array1<f64>, Array1<f64>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }

    /// One timestep: (h_prev, c_prev) -> (h_next, c_next).
    fn forward(
        &self,
        x: ArrayView1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let i_gate = sigmoid(&(self.w_ii.dot(&x) + self.w_hi.dot(h_prev) + &self.b_i));
        let f_gate = sigmoid(&(self.w_if.dot(&x) + self.w_hf.dot(h_prev) + &self.b_f));
        let g = tanh(&(self.w_ig.dot(&x) + self.w_hg.dot(h_prev) + &self.b_g));
        let o_gate = sigmoid(&(self.w_io.dot(&x) + self.w_ho.dot(h_prev) + &self.b_o));

        let c_next = &f_gate * c_prev + &i_gate * &g;
        let h_next = &o_gate * &tanh(&c_next);
        (h_next, c_next)
    }
}

/// Two stacked LSTM layers plus a linear head mapping a
/// [timesteps, features] window to one scalar.
///
/// Parameters are an opaque serializable blob; only the trainer mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModel {
    pub timesteps: usize,
    pub features: usize,
    pub hidden_units: usize,
    dropout: f64,
    layer1: LstmCell,
    layer2: LstmCell,
    pub(crate) head_weights: Array1<f64>,
    pub(crate) head_bias: f64,
}

impl ForecastModel {
    /// Randomly initialized model for the given hyperparameters.
    pub fn new(config: &ForecastConfig) -> Self {
        let mut rng = rand::rng();
        let limit = (1.0 / config.hidden_units as f64).sqrt();
        let head_weights =
            Array1::from_shape_fn(config.hidden_units, |_| rng.random_range(-limit..limit));

        Self {
            timesteps: config.timesteps,
            features: config.features,
            hidden_units: config.hidden_units,
            dropout: config.dropout,
            layer1: LstmCell::new(config.features, config.hidden_units, &mut rng),
            layer2: LstmCell::new(config.hidden_units, config.hidden_units, &mut rng),
            head_weights,
            head_bias: 0.0,
        }
    }

    /// Runs one window through both recurrent layers and returns the second
    /// layer's final hidden state. The optional mask applies inverted
    /// dropout to the first layer's output sequence (training only).
    pub(crate) fn encode(
        &self,
        window: ArrayView2<f64>,
        dropout_mask: Option<&Array1<f64>>,
    ) -> Array1<f64> {
        let (mut h1, mut c1) = self.layer1.init_state();
        let (mut h2, mut c2) = self.layer2.init_state();

        for t in 0..window.nrows() {
            let (h, c) = self.layer1.forward(window.row(t), &h1, &c1);
            h1 = h;
            c1 = c;

            let layer2_input = match dropout_mask {
                Some(mask) => &h1 * mask,
                None => h1.clone(),
            };
            let (h, c) = self.layer2.forward(layer2_input.view(), &h2, &c2);
            h2 = h;
            c2 = c;
        }
        h2
    }

    pub(crate) fn output(&self, hidden: &Array1<f64>) -> f64 {
        self.head_weights.dot(hidden) + self.head_bias
    }

    /// Deterministic forward pass over one [timesteps, features] window.
    pub fn forward(&self, window: ArrayView2<f64>) -> f64 {
        self.output(&self.encode(window, None))
    }

    /// Forward pass over a [batch, timesteps, features] tensor, one scalar
    /// per sample.
    pub fn forward_batch(&self, x: &Array3<f64>) -> Array1<f64> {
        let batch = x.shape()[0];
        let mut outputs = Array1::zeros(batch);
        for i in 0..batch {
            outputs[i] = self.forward(x.slice(s![i, .., ..]));
        }
        outputs
    }

    /// Inverted-dropout mask over the inter-layer activations, or `None`
    /// when dropout is disabled.
    pub(crate) fn dropout_mask(&self, rng: &mut impl Rng) -> Option<Array1<f64>> {
        if self.dropout <= 0.0 {
            return None;
        }
        let keep = 1.0 - self.dropout;
        Some(Array1::from_shape_fn(self.hidden_units, |_| {
            if rng.random::<f64>() < keep {
                1.0 / keep
            } else {
                0.0
            }
        }))
    }
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::tanh)
}
