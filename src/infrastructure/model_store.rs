//! Model persistence boundary.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::application::forecast::model::ForecastModel;
use crate::domain::errors::{ForecastError, PersistenceError};

/// Persistence boundary for trained parameters. Contract: a save -> load
/// round trip reproduces identical predictions on identical inputs.
pub trait ModelStore {
    fn save(&self, model: &ForecastModel) -> Result<(), ForecastError>;
    fn load(&self) -> Result<ForecastModel, ForecastError>;
}

/// Stores the serialized model as a JSON blob on disk.
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModelStore for FileModelStore {
    fn save(&self, model: &ForecastModel) -> Result<(), ForecastError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(PersistenceError::Io)?;
        }
        let file = File::create(&self.path).map_err(PersistenceError::Io)?;
        serde_json::to_writer(BufWriter::new(file), model).map_err(PersistenceError::Codec)?;
        info!(path = %self.path.display(), "model saved");
        Ok(())
    }

    fn load(&self) -> Result<ForecastModel, ForecastError> {
        let file = File::open(&self.path).map_err(PersistenceError::Io)?;
        let model: ForecastModel =
            serde_json::from_reader(BufReader::new(file)).map_err(PersistenceError::Codec)?;
        info!(path = %self.path.display(), "model loaded");
        Ok(model)
    }
}
