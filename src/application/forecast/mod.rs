pub mod model;
pub mod optimizer;
pub mod predictor;
pub mod trainer;

pub use model::ForecastModel;
pub use predictor::PricePredictor;
pub use trainer::{CancelToken, EpochReport, TrainOutcome};
