//! Window assembly for the recurrent model.
//!
//! Inference and training intentionally build their windows differently and
//! the two paths must stay separate. Inference consumes full multi-feature
//! rows and never pads; training consumes raw 1-D scalar histories, placing
//! each value at feature index 0 and zero-filling the remaining feature
//! slots. Unifying them would silently mask the asymmetry.

use ndarray::{Array2, Array3, s};

use crate::domain::errors::ForecastError;

/// Takes the most recent `timesteps` normalized rows as a batch-of-one
/// window shaped [1, timesteps, features].
///
/// Fails instead of padding when fewer than `timesteps` rows are available.
pub fn inference_window(
    normalized: &Array2<f64>,
    timesteps: usize,
) -> Result<Array3<f64>, ForecastError> {
    let rows = normalized.nrows();
    if rows < timesteps {
        return Err(ForecastError::InsufficientData {
            need: timesteps,
            got: rows,
        });
    }

    let features = normalized.ncols();
    let start = rows - timesteps;
    let mut window = Array3::zeros((1, timesteps, features));
    window
        .slice_mut(s![0, .., ..])
        .assign(&normalized.slice(s![start.., ..]));
    Ok(window)
}

/// Reshapes raw 1-D training inputs into [n, timesteps, features] tensors.
///
/// Each input contributes up to its last `timesteps` scalars, written at
/// feature index 0 with the other feature slots left at zero. Inputs shorter
/// than `timesteps` are right-aligned so the most recent value lands in the
/// final row. This single-feature layout is a deliberate simplification of
/// the raw examples, not the inference path.
pub fn training_rows(inputs: &Array2<f64>, timesteps: usize, features: usize) -> Array3<f64> {
    let n = inputs.nrows();
    let len = inputs.ncols();
    let mut tensor = Array3::zeros((n, timesteps, features));

    let take = len.min(timesteps);
    for i in 0..n {
        for (offset, t) in (timesteps - take..timesteps).enumerate() {
            tensor[[i, t, 0]] = inputs[[i, len - take + offset]];
        }
    }
    tensor
}
