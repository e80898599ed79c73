//! Custom field installer CLI entrypoint.
//!
//! This is the main entrypoint for the `custom-fields` command-line tool.

use std::path::Path;
use std::process::ExitCode;

use custom_field_installer::cli::{Cli, Commands, OutputFormatter, exit_status, prepare};
use custom_field_installer::context::ExecutionContext;
use custom_field_installer::error::Result;
use custom_field_installer::manifest::XmlManifestLoader;
use custom_field_installer::reconciler::FieldSetReconciler;
use custom_field_installer::store::LocalFieldSetStore;

use clap::Parser;
use tracing_subscriber::EnvFilter;

type Reconciler<'a> = FieldSetReconciler<'a, LocalFieldSetStore, XmlManifestLoader>;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Store calls run one after another on a single thread
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);

    let result = runtime.block_on(run(cli, &formatter));
    if let Err(e) = &result {
        eprintln!("{}", formatter.error(&format!("Error: {e}")));
    }
    ExitCode::from(exit_status(&result))
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let title = formatter.format_title(cli.command.description(), cli.command.name());
    if !title.is_empty() {
        eprintln!("{title}");
    }

    // The manifest is checked before configuration or store are touched.
    let store = prepare(
        cli.command.manifest(),
        cli.config.as_deref(),
        cli.store.as_deref(),
    )?;
    let loader = XmlManifestLoader::new();
    let reconciler = FieldSetReconciler::new(&store, &loader);

    match &cli.command {
        Commands::Install { manifest } => cmd_install(&reconciler, manifest, formatter).await,
        Commands::Uninstall { manifest } => cmd_uninstall(&reconciler, manifest, formatter).await,
        Commands::Status { manifest } => cmd_status(&reconciler, manifest, formatter).await,
    }
}

/// Install custom fields.
async fn cmd_install(
    reconciler: &Reconciler<'_>,
    manifest: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let result = reconciler.install(manifest, &ExecutionContext::new()).await?;

    eprintln!("{}", formatter.format_result(&result));
    eprintln!("{}", formatter.success("Custom fields installed"));
    Ok(())
}

/// Uninstall custom fields.
async fn cmd_uninstall(
    reconciler: &Reconciler<'_>,
    manifest: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    // Indexing stays off for the whole uninstall run.
    let context = ExecutionContext::new().without_indexing();
    let result = reconciler.uninstall(manifest, &context).await?;

    eprintln!("{}", formatter.format_result(&result));
    eprintln!("{}", formatter.success("Custom fields uninstalled"));
    Ok(())
}

/// Show drift between the manifest and the store.
async fn cmd_status(
    reconciler: &Reconciler<'_>,
    manifest: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let report = reconciler
        .check_drift(manifest, &ExecutionContext::new())
        .await?;

    eprintln!("{}", formatter.format_drift(&report));
    Ok(())
}
