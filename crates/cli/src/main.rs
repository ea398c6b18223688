use clap::{Parser, Subcommand};
use oci_core::{
    available_periods, compile_rules, ingest, BillingPeriod, BundleId, BundleRule, CoreConfig,
    OciService,
};
use oci_tables::{load_catalog_dir, read_requisitions_path, write_annotated, ColumnMapping};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "oci")]
#[command(about = "Identify bundled procedure groups (OCI) in requisition records")]
struct Cli {
    /// Column mapping YAML (defaults to the standard column names)
    #[arg(long, global = true)]
    columns: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify bundles and write the annotated rows as CSV
    Process {
        /// Requisition CSV file
        requisitions: PathBuf,
        /// Directory holding pacotes.csv, cid.csv and oci_nome.csv
        #[arg(long, default_value = "bases_auxiliares")]
        catalog_dir: PathBuf,
        /// Output CSV file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Billing period MM/YYYY; keeps executions in it and the month before
        #[arg(long)]
        period: Option<String>,
        /// Settings YAML
        #[arg(long)]
        config: Option<PathBuf>,
        /// Also emit rows outside every closed bundle
        #[arg(long)]
        keep_unmatched: bool,
    },
    /// List the billing periods covered by the execution dates
    Periods {
        /// Requisition CSV file
        requisitions: PathBuf,
    },
    /// Show compiled bundle rules
    Rules {
        /// Directory holding pacotes.csv, cid.csv and oci_nome.csv
        #[arg(long, default_value = "bases_auxiliares")]
        catalog_dir: PathBuf,
        /// Only show this bundle
        #[arg(long)]
        bundle: Option<String>,
    },
}

fn load_mapping(path: Option<&Path>) -> Result<ColumnMapping, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => ColumnMapping::from_yaml_file(path)?,
        None => ColumnMapping::default(),
    })
}

fn print_rule(bundle_id: &BundleId, rule: &BundleRule) {
    let join = |codes: &[oci_core::ProcedureCode]| {
        codes
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!("{bundle_id}");
    println!("  required: {}", join(&rule.required));
    for group in &rule.alternative_groups {
        println!("  one of ({}): {}", group.tag, join(&group.codes));
    }
    println!("  optional: {}", join(&rule.optional));
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("oci=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mapping = load_mapping(cli.columns.as_deref())?;

    match cli.command {
        Some(Commands::Process {
            requisitions,
            catalog_dir,
            output,
            period,
            config,
            keep_unmatched,
        }) => {
            let cfg = match config {
                Some(path) => CoreConfig::from_yaml_file(&path)?,
                None => CoreConfig::default(),
            };
            let cfg = if keep_unmatched {
                cfg.with_keep_unmatched(true)
            } else {
                cfg
            };
            let period = period.map(|p| p.parse::<BillingPeriod>()).transpose()?;

            let table = read_requisitions_path(&requisitions, &mapping)?;
            let catalogs = load_catalog_dir(&catalog_dir, &mapping)?;
            let service = OciService::new(Arc::new(cfg));
            let rows = service.process(catalogs.into_input(table.rows), period);
            let summarized = service.config().summarize();

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)?;
                    write_annotated(file, &table.headers, &rows, &mapping, summarized)?;
                    println!("Wrote {} rows to {}", rows.len(), path.display());
                }
                None => {
                    let stdout = std::io::stdout().lock();
                    write_annotated(stdout, &table.headers, &rows, &mapping, summarized)?;
                }
            }
        }
        Some(Commands::Periods { requisitions }) => {
            let table = read_requisitions_path(&requisitions, &mapping)?;
            let rows = ingest(table.rows, &CoreConfig::default());
            let periods = available_periods(&rows);
            if periods.is_empty() {
                println!("No executed requisitions found.");
            } else {
                for period in periods {
                    println!("{period}");
                }
            }
        }
        Some(Commands::Rules {
            catalog_dir,
            bundle,
        }) => {
            let catalogs = load_catalog_dir(&catalog_dir, &mapping)?;
            let rules = compile_rules(&catalogs.rules);
            match bundle {
                Some(id) => {
                    let id = BundleId::new(id)?;
                    match rules.get(&id) {
                        Some(rule) => print_rule(&id, rule),
                        None => eprintln!("Bundle {id} not found"),
                    }
                }
                None => {
                    for (id, rule) in &rules {
                        print_rule(id, rule);
                    }
                }
            }
        }
        None => {
            println!("Use 'oci --help' for commands");
        }
    }

    Ok(())
}
