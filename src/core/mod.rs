pub mod batch;
pub mod confidence;
pub mod duty;
pub mod engine;
pub mod orchestrator;
pub mod schema;
pub mod summary;

pub use crate::domain::model::{
    BatchOutcome, BatchRow, BatchSummary, CanonicalTable, ClassificationResult, DutyBreakdown,
    MappingReport, ProductRecord, RawTable, ShippingMethod,
};
pub use crate::domain::ports::{Classifier, Storage};
pub use crate::utils::error::Result;
