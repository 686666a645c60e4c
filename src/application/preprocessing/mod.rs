pub mod normalizer;
pub mod sequence;
pub mod volatility;

pub use normalizer::normalize_global;
pub use sequence::{inference_window, training_rows};
pub use volatility::realized_volatility;
