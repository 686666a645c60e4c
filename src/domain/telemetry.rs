use serde::{Deserialize, Serialize};

/// Ordered list of feature names.
/// This order MUST match the column order produced by `NetworkSample::features`.
/// Any change here is a breaking change for persisted models.
pub const FEATURE_NAMES: &[&str] = &[
    "btc_price",
    "mempool_size",
    "hashrate",
    "exchange_inflows",
    "timestamp",
];

/// Number of numeric measurements per sample.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// One observation of Bitcoin network telemetry at a fixed cadence.
/// Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSample {
    pub btc_price: f64,
    pub mempool_size: f64,
    pub hashrate: f64,
    pub exchange_inflows: f64,
    /// Unix seconds.
    pub timestamp: f64,
}

impl NetworkSample {
    /// Projects the sample to its fixed feature tuple, in `FEATURE_NAMES` order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.btc_price,
            self.mempool_size,
            self.hashrate,
            self.exchange_inflows,
            self.timestamp,
        ]
    }
}

/// One labeled (input window -> target) pair consumed by the trainer.
///
/// Inputs are raw 1-D scalar histories; the trainer reshapes them into the
/// padded single-feature layout the model expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    pub input: Vec<f64>,
    pub output: f64,
}

/// Short-term price direction derived from the two most recent prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Forecast produced per call; never persisted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_price: f64,
    /// In [0, 1], inversely related to recent volatility.
    pub confidence: f64,
    pub trend: Trend,
    /// Population standard deviation of simple returns, >= 0.
    pub volatility: f64,
}
