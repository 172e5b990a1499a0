//! metamigrate - Shopify metafield definition migration
//!
//! CLI entry point.

use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use metamigrate::cli::{Cli, Command, OutputFormat, parse_log_level};
use metamigrate::config::Config;
use metamigrate::migrate::{
    self, DeletionStatus, FieldStatus, MigrationPlan, MigrationReport, Migrator, TypeStatus,
};
use metamigrate::{AdminClient, GraphqlClient};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => parse_log_level(s).unwrap_or_else(|| {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
            tracing::Level::INFO
        }),
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("{}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Migrate { overwrite, format } => cmd_migrate(config, overwrite, format).await,
        Command::Plan { format } => cmd_plan(config, format).await,
        Command::Fields { format } => cmd_fields(&config, format).await,
        Command::Types { format } => cmd_types(&config, format).await,
    }
}

fn connect(config: &Config) -> Result<(Arc<dyn GraphqlClient>, Arc<dyn GraphqlClient>)> {
    config.validate().context("Invalid configuration")?;
    let source = AdminClient::from_config(&config.source, &config.api).context("Failed to create source client")?;
    let destination =
        AdminClient::from_config(&config.destination, &config.api).context("Failed to create destination client")?;
    info!(source = %source.endpoint(), destination = %destination.endpoint(), "Connected clients");
    let source: Arc<dyn GraphqlClient> = Arc::new(source);
    let destination: Arc<dyn GraphqlClient> = Arc::new(destination);
    Ok((source, destination))
}

async fn cmd_migrate(config: Config, overwrite: bool, format: OutputFormat) -> Result<()> {
    debug!(overwrite, ?format, "cmd_migrate: called");
    let (source, destination) = connect(&config)?;

    let mut migration = config.migration.clone();
    migration.overwrite_existing |= overwrite;

    let report = Migrator::new(source, destination, migration)
        .run()
        .await
        .context("Migration aborted")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    let failures = report.summary().failures();
    if failures > 0 {
        return Err(eyre::eyre!("{} item(s) failed to migrate", failures));
    }
    Ok(())
}

async fn cmd_plan(config: Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_plan: called");
    let (source, destination) = connect(&config)?;
    let plan = Migrator::new(source, destination, config.migration)
        .plan()
        .await
        .context("Planning failed")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
        OutputFormat::Text => print_plan(&plan),
    }
    Ok(())
}

async fn cmd_fields(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_fields: called");
    let source = AdminClient::from_config(&config.source, &config.api).context("Failed to create source client")?;
    let definitions = migrate::fetch_field_definitions(
        &source,
        &config.migration.owner_type,
        config.migration.field_page_size,
        config.migration.type_page_size,
    )
    .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&definitions)?),
        OutputFormat::Text => {
            if definitions.is_empty() {
                println!("No metafield definitions found");
            }
            for def in &definitions {
                let target = match def.referenced_type_name() {
                    Some(t) => format!(" -> {}", t.cyan()),
                    None => String::new(),
                };
                println!(
                    "{}.{} {}{}",
                    def.namespace.yellow(),
                    def.key,
                    def.type_name().dimmed(),
                    target
                );
            }
        }
    }
    Ok(())
}

async fn cmd_types(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_types: called");
    let destination =
        AdminClient::from_config(&config.destination, &config.api).context("Failed to create destination client")?;
    let mapping = migrate::load_existing_types(&destination, config.migration.type_page_size).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&mapping)?),
        OutputFormat::Text => {
            if mapping.is_empty() {
                println!("No metaobject definitions found");
            }
            for (type_name, id) in mapping.iter() {
                println!("{} {}", type_name.cyan(), id.dimmed());
            }
        }
    }
    Ok(())
}

fn print_report(report: &MigrationReport) {
    println!("Metafield migration {} ({})", report.run_id.cyan(), report.owner_type);
    println!("-----------------");

    for t in &report.types {
        match &t.status {
            TypeStatus::Existing { id } => println!("  {} type {} exists ({})", "=".dimmed(), t.type_name, id.dimmed()),
            TypeStatus::Created { id } => println!("  {} type {} created ({})", "✓".green(), t.type_name, id.dimmed()),
            TypeStatus::Failed { reason } => println!("  {} type {}: {}", "✗".red(), t.type_name, reason),
        }
    }

    for f in &report.fields {
        let name = format!("{}.{}", f.destination_namespace, f.key);
        match &f.deletion {
            Some(DeletionStatus::Deleted { id }) => println!("  {} {} deleted ({})", "-".yellow(), name, id.dimmed()),
            Some(DeletionStatus::Failed { reason }) => println!("  {} {} delete: {}", "✗".red(), name, reason),
            Some(DeletionStatus::NotFound) | None => {}
        }
        match &f.status {
            FieldStatus::Created { .. } => println!("  {} {}", "✓".green(), name),
            FieldStatus::CreatedUnbound { referenced_type, .. } => println!(
                "  {} {} created without validation (no metaobject definition for {})",
                "!".yellow(),
                name,
                referenced_type
            ),
            FieldStatus::Failed { reason } => println!("  {} {}: {}", "✗".red(), name, reason),
        }
    }

    let s = report.summary();
    println!();
    println!(
        "Types:  {} existing, {} created, {} failed",
        s.types_existing, s.types_created, s.types_failed
    );
    println!(
        "Fields: {} created, {} unbound, {} failed",
        s.fields_created, s.fields_unbound, s.fields_failed
    );
    if s.deletions + s.deletions_failed > 0 {
        println!("Deletes: {} done, {} failed", s.deletions, s.deletions_failed);
    }
    println!("Finished in {:.1}s", report.duration_seconds());
}

fn print_plan(plan: &MigrationPlan) {
    println!("Migration plan ({})", plan.owner_type);
    println!("-----------------");
    if plan.fields.is_empty() {
        println!("No metafield definitions on source, nothing to do");
        return;
    }

    for t in &plan.types {
        match &t.existing_id {
            Some(id) => println!("  {} type {} exists ({})", "=".dimmed(), t.type_name, id.dimmed()),
            None => println!("  {} type {} will be created", "+".green(), t.type_name),
        }
    }
    for f in &plan.fields {
        let rename = if f.namespace != f.destination_namespace {
            format!(" (from {})", f.namespace).dimmed().to_string()
        } else {
            String::new()
        };
        let target = match &f.referenced_type {
            Some(t) => format!(" -> {}", t.cyan()),
            None => String::new(),
        };
        println!(
            "  {} {}.{} {}{}{}",
            "+".green(),
            f.destination_namespace,
            f.key,
            f.type_name.dimmed(),
            target,
            rename
        );
    }
    println!();
    println!(
        "{} type(s) to create, {} definition(s) to write",
        plan.types_to_create().count(),
        plan.fields.len()
    );
}
