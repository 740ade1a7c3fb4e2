pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::csv_source;
pub use adapters::http_classifier::HttpClassifier;
pub use adapters::local_storage::LocalStorage;
pub use config::CliConfig;
pub use core::batch::{BatchOptions, BatchRunner};
pub use core::duty::DutyFeeCalculator;
pub use core::engine::BatchEngine;
pub use core::orchestrator::ClassificationOrchestrator;
pub use core::schema::SchemaMapper;
pub use utils::error::{BatchError, Result};
