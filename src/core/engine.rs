use crate::core::batch::{BatchOptions, BatchRunner};
use crate::core::duty::DutyFeeCalculator;
use crate::core::orchestrator::ClassificationOrchestrator;
use crate::core::schema::SchemaMapper;
use crate::core::summary;
use crate::domain::model::{
    BatchOutcome, BatchRow, BatchSummary, ClassificationSource, DutyBreakdown, MappingReport,
    RawTable, RowStatus,
};
use crate::domain::ports::{Classifier, Storage};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const ARCHIVE_NAME: &str = "batch_results.zip";

/// Nested export envelope: the raw row total and failure count live beside
/// the filtered financial summary.
#[derive(Serialize)]
struct SummaryEnvelope<'a> {
    rows_total: usize,
    rows_failed: usize,
    summary: &'a BatchSummary,
}

/// Drives a full batch: schema mapping, per-row classification and duty
/// calculation, aggregation, and export of the artifacts through storage.
pub struct BatchEngine<S: Storage> {
    storage: S,
    mapper: SchemaMapper,
}

impl<S: Storage> BatchEngine<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            mapper: SchemaMapper::new(),
        }
    }

    /// Run the whole pipeline over a raw table. Only input-level validation
    /// can fail the run; per-row problems are recorded in the rows.
    pub async fn run(
        &self,
        table: &RawTable,
        primary: &dyn Classifier,
        fallback: Option<&dyn Classifier>,
        options: BatchOptions,
        progress: &mut dyn FnMut(usize, usize, &str),
    ) -> Result<BatchOutcome> {
        tracing::info!("Mapping input schema ({} columns)...", table.headers.len());
        let (canonical, mapping) = self.mapper.map(table)?;
        tracing::info!(
            "Mapped {} rows ({} detected, {} synthesized columns)",
            canonical.rows.len(),
            mapping.detected.len(),
            mapping.created.len()
        );

        tracing::info!("Classifying {} products...", canonical.rows.len());
        let orchestrator = ClassificationOrchestrator::new(primary, fallback);
        let mut calculator = DutyFeeCalculator::new();
        let runner = BatchRunner::new(options);
        let rows = runner
            .run(&canonical, &orchestrator, Some(&mut calculator), progress)
            .await;

        let rows_total = rows.len();
        let rows_failed = rows.iter().filter(|r| r.status == RowStatus::Failed).count();
        tracing::info!("Processed {} rows ({} failed)", rows_total, rows_failed);

        tracing::info!("Aggregating duty summary...");
        let summary = summary::summarize(&rows);

        tracing::info!("Exporting batch artifacts...");
        let archive = build_archive(&rows, &summary, &mapping, rows_total, rows_failed)?;
        self.storage.write_file(ARCHIVE_NAME, &archive).await?;
        tracing::info!("Archive written: {}", ARCHIVE_NAME);

        Ok(BatchOutcome {
            rows,
            summary,
            mapping,
            rows_total,
            rows_failed,
            archive_path: ARCHIVE_NAME.to_string(),
        })
    }
}

fn build_archive(
    rows: &[BatchRow],
    summary: &BatchSummary,
    mapping: &MappingReport,
    rows_total: usize,
    rows_failed: usize,
) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("results.csv", FileOptions::default())?;
    zip.write_all(&rows_to_csv(rows)?)?;

    zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
    let envelope = SummaryEnvelope {
        rows_total,
        rows_failed,
        summary,
    };
    zip.write_all(serde_json::to_string_pretty(&envelope)?.as_bytes())?;

    zip.start_file::<_, ()>("mapping.json", FileOptions::default())?;
    zip.write_all(serde_json::to_string_pretty(mapping)?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Flatten the result table to one CSV record per row.
fn rows_to_csv(rows: &[BatchRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record([
        "product_name",
        "description",
        "material",
        "intended_use",
        "origin",
        "hs_code",
        "confidence",
        "duty_rate",
        "reasoning",
        "needs_review",
        "source",
        "customs_value",
        "base_duty",
        "processing_fee",
        "maintenance_fee",
        "total_fees",
        "total_landed_cost",
        "effective_rate_percent",
        "status",
        "processed_at",
    ])?;

    for row in rows {
        let duties = row.duties.clone().unwrap_or_else(DutyBreakdown::zeroed);
        let status = match row.status {
            RowStatus::Success => "Success",
            RowStatus::Failed => "Failed",
        };
        let source = match row.classification.source {
            ClassificationSource::Primary => "primary",
            ClassificationSource::Fallback => "fallback",
        };

        let record: [String; 20] = [
            row.product.product_name.clone(),
            row.product.description.clone(),
            row.product.material.clone(),
            row.product.intended_use.clone(),
            row.product.origin.clone(),
            row.classification.code.clone(),
            format!("{:.2}", row.classification.confidence),
            row.classification.duty_rate.clone(),
            row.classification.reasoning.clone(),
            row.classification.needs_review.to_string(),
            source.to_string(),
            format!("{:.2}", duties.customs_value),
            format!("{:.2}", duties.base_duty),
            format!("{:.2}", duties.processing_fee),
            format!("{:.2}", duties.maintenance_fee),
            format!("{:.2}", duties.total_fees),
            format!("{:.2}", duties.total_landed_cost),
            format!("{:.2}", duties.effective_rate_percent),
            status.to_string(),
            row.processed_at.to_rfc3339(),
        ];
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::utils::error::BatchError::Io(std::io::Error::other(e)))
}
