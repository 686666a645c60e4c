use clap::Parser;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chainforecast::application::forecast::{CancelToken, PricePredictor};
use chainforecast::config::ForecastConfig;
use chainforecast::domain::telemetry::{NetworkSample, TrainingExample};
use chainforecast::infrastructure::model_store::{FileModelStore, ModelStore};

#[derive(Debug, Deserialize)]
struct TelemetryRecord {
    btc_price: f64,
    mempool_size: f64,
    hashrate: f64,
    exchange_inflows: f64,
    timestamp: f64,
}

impl From<TelemetryRecord> for NetworkSample {
    fn from(r: TelemetryRecord) -> Self {
        Self {
            btc_price: r.btc_price,
            mempool_size: r.mempool_size,
            hashrate: r.hashrate,
            exchange_inflows: r.exchange_inflows,
            timestamp: r.timestamp,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to telemetry history CSV
    #[arg(long, default_value = "data/telemetry.csv")]
    input: PathBuf,

    /// Path to output model file
    #[arg(long, default_value = "data/forecast_model.json")]
    output: PathBuf,

    /// Number of training epochs
    #[arg(long, default_value_t = 50)]
    epochs: usize,

    /// Maximum number of rows to use (most recent). 0 = use all.
    #[arg(long, default_value_t = 0)]
    max_rows: usize,
}

/// Builds sliding-window (price window -> next price) pairs from history.
fn build_examples(samples: &[NetworkSample], window: usize) -> Vec<TrainingExample> {
    let prices: Vec<f64> = samples.iter().map(|s| s.btc_price).collect();
    (window..prices.len())
        .map(|i| TrainingExample {
            input: prices[i - window..i].to_vec(),
            output: prices[i],
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ForecastConfig::from_env();

    if !args.input.exists() {
        anyhow::bail!(
            "telemetry CSV not found at {:?}; export history from the data collector first",
            args.input
        );
    }

    info!(path = %args.input.display(), "loading telemetry history");
    let file = File::open(&args.input)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut samples: Vec<NetworkSample> = Vec::new();
    for record in reader.deserialize() {
        let record: TelemetryRecord = record?;
        samples.push(record.into());
    }

    if args.max_rows > 0 && samples.len() > args.max_rows {
        let skip = samples.len() - args.max_rows;
        samples.drain(..skip);
        info!(kept = samples.len(), skipped = skip, "truncated history");
    }

    let examples = build_examples(&samples, config.timesteps);
    if examples.is_empty() {
        anyhow::bail!(
            "not enough history: {} samples, need more than {}",
            samples.len(),
            config.timesteps
        );
    }
    info!(examples = examples.len(), epochs = args.epochs, "training");

    let predictor = PricePredictor::new(config);
    let outcome = predictor.fit(&examples, args.epochs, &CancelToken::new(), |report| {
        info!(
            epoch = report.epoch,
            total = report.epochs,
            loss = report.loss,
            mae = report.mae,
            val_loss = ?report.val_loss,
            "epoch complete"
        );
    })?;
    info!(
        epochs_run = outcome.epochs_run,
        final_loss = ?outcome.loss_history.last(),
        "training finished"
    );

    let store = FileModelStore::new(&args.output);
    predictor.with_parameters(|model| store.save(model))??;

    // Sanity forecast over the freshest window.
    let prediction = predictor.predict(&samples)?;
    info!(
        predicted_price = prediction.predicted_price,
        trend = ?prediction.trend,
        confidence = prediction.confidence,
        volatility = prediction.volatility,
        "forecast on latest history"
    );

    Ok(())
}
