use anyhow::Context;
use clap::Parser;
use tariff_etl::domain::ports::Classifier;
use tariff_etl::utils::{logger, validation::Validate};
use tariff_etl::{csv_source, BatchEngine, CliConfig, HttpClassifier, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting tariff-etl batch run");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let options = config.batch_options()?;

    let input = std::fs::read(&config.input)
        .with_context(|| format!("failed to read input file {}", config.input))?;
    let table = csv_source::read_csv(&input)?;
    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        config.input
    );

    let primary = HttpClassifier::new(config.classifier_endpoint.clone());
    let fallback = config
        .fallback_endpoint
        .clone()
        .map(HttpClassifier::new);
    let fallback_ref = fallback.as_ref().map(|f| f as &dyn Classifier);

    let storage = LocalStorage::new(config.output_path.clone());
    let engine = BatchEngine::new(storage);

    let mut progress = |i: usize, n: usize, label: &str| {
        tracing::info!("[{}/{}] {}", i, n, label);
    };

    match engine
        .run(&table, &primary, fallback_ref, options, &mut progress)
        .await
    {
        Ok(outcome) => {
            tracing::info!("Batch completed successfully");
            println!(
                "✅ Processed {} products ({} failed)",
                outcome.rows_total, outcome.rows_failed
            );
            println!(
                "   Total customs value: ${:.2} | total fees: ${:.2} | avg effective rate: {:.2}%",
                outcome.summary.total_customs_value,
                outcome.summary.total_fees,
                outcome.summary.average_effective_rate
            );
            println!(
                "📁 Results archive: {}/{}",
                config.output_path, outcome.archive_path
            );
        }
        Err(e) => {
            tracing::error!("Batch failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
