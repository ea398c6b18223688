use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oci_core::{BillingPeriod, CoreConfig, OciService};
use oci_tables::{ColumnMapping, load_catalog_dir, read_requisitions_path, write_annotated};

/// Main entry point for a batch OCI identification run
///
/// Reads one requisition export plus the auxiliary catalogues, identifies closed bundles and
/// writes the annotated rows as CSV.
///
/// # Environment Variables
/// - `OCI_REQUISITIONS`: requisition CSV file (required)
/// - `OCI_CATALOG_DIR`: directory with pacotes.csv, cid.csv and oci_nome.csv
///   (default: "bases_auxiliares")
/// - `OCI_OUTPUT`: output CSV file (default: "oci_identificada.csv")
/// - `OCI_CONFIG`: settings YAML (optional)
/// - `OCI_COLUMNS`: column mapping YAML (optional)
/// - `OCI_PERIOD`: billing period as MM/YYYY (optional)
///
/// # Returns
/// * `Ok(())` - If the batch completes and the output is written
/// * `Err(anyhow::Error)` - If configuration, input tables or output fail
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("oci=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let requisitions: PathBuf = std::env::var("OCI_REQUISITIONS")
        .map_err(|_| anyhow::anyhow!("OCI_REQUISITIONS must point at the requisition CSV"))?
        .into();
    let catalog_dir: PathBuf = std::env::var("OCI_CATALOG_DIR")
        .unwrap_or_else(|_| "bases_auxiliares".into())
        .into();
    let output: PathBuf = std::env::var("OCI_OUTPUT")
        .unwrap_or_else(|_| "oci_identificada.csv".into())
        .into();

    let cfg = match std::env::var("OCI_CONFIG") {
        Ok(path) => CoreConfig::from_yaml_file(&PathBuf::from(path))?,
        Err(_) => CoreConfig::default(),
    };
    let mapping = match std::env::var("OCI_COLUMNS") {
        Ok(path) => ColumnMapping::from_yaml_file(&PathBuf::from(path))?,
        Err(_) => ColumnMapping::default(),
    };
    let period = std::env::var("OCI_PERIOD")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.parse::<BillingPeriod>())
        .transpose()?;

    tracing::info!("++ Reading requisitions from {}", requisitions.display());
    tracing::info!("++ Reading catalogues from {}", catalog_dir.display());
    if let Some(period) = period {
        tracing::info!("++ Billing period {}", period);
    }

    let table = read_requisitions_path(&requisitions, &mapping)?;
    let catalogs = load_catalog_dir(&catalog_dir, &mapping)?;

    let service = OciService::new(Arc::new(cfg));
    let rows = service.process(catalogs.into_input(table.rows), period);

    let file = std::fs::File::create(&output)?;
    write_annotated(file, &table.headers, &rows, &mapping, service.config().summarize())?;

    let instances: std::collections::BTreeSet<_> =
        rows.iter().filter_map(|r| r.instance.as_ref()).collect();
    tracing::info!(
        "++ {} rows in {} bundle instances written to {}",
        rows.len(),
        instances.len(),
        output.display()
    );

    Ok(())
}
