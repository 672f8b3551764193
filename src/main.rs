use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::debug;
use redframe::config::RedframeConfig;
use redframe::dialect::{ParamStyle, Params};
use redframe::materializer::Materializer;
use redframe::model::ModelCatalog;
use redframe::query::{Op, Query};
use redframe::table::Value;
use serde::Serialize;

/// Redframe - inspect model catalogs and the SQL they compile to
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file (defaults to REDFRAME_* environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the models in a catalog with their columns
    Models {
        /// Model catalog (YAML)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Compile a model's default query and print the SQL with its extracted params
    Compile {
        /// Model catalog (YAML)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Model name
        #[arg(long)]
        model: String,

        /// Target dialect (defaults to the configured one)
        #[arg(long)]
        dialect: Option<String>,

        /// Maximum number of rows
        #[arg(long)]
        limit: Option<u64>,

        /// Equality filter, COL=VALUE. VALUE is read as JSON, falling back to text.
        #[arg(long = "where", value_name = "COL=VALUE")]
        filters: Vec<String>,
    },
}

#[derive(Serialize)]
struct CompileOutput {
    sql: String,
    params: Params,
}

fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Defaults to the configured level, can be overridden with RUST_LOG
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    if let Err(e) = run(cli.command, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RedframeConfig> {
    let mut config = match &cli.config {
        Some(path) => RedframeConfig::from_yaml_file(path)?,
        None => RedframeConfig::from_env()?,
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
        config.check()?;
    }
    Ok(config)
}

fn load_catalog(catalog: Option<PathBuf>, config: &RedframeConfig) -> anyhow::Result<ModelCatalog> {
    let path = catalog
        .or_else(|| config.catalog_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow!("no catalog given (use --catalog or REDFRAME_CATALOG)"))?;
    ModelCatalog::from_yaml_file(&path)
        .with_context(|| format!("loading catalog {}", path.display()))
}

fn run(command: Command, config: &RedframeConfig) -> anyhow::Result<()> {
    match command {
        Command::Models { catalog } => {
            let catalog = load_catalog(catalog, config)?;
            for model in &catalog.models {
                println!("{} ({}): {}", model.name, model.table, model.columns.join(", "));
            }
        }
        Command::Compile {
            catalog,
            model,
            dialect,
            limit,
            filters,
        } => {
            let catalog = load_catalog(catalog, config)?;
            let descriptor = catalog.get(&model)?;
            let dialect = dialect.unwrap_or_else(|| config.default_dialect.clone());

            let materializer = Materializer::from_config(config)?;
            let extractor = materializer.registry().resolve(&dialect)?;

            let style = compile_style(config, &dialect);

            let mut query = Query::for_model(descriptor);
            for filter in &filters {
                let (column, value) = parse_filter(filter)?;
                query = query.filter(column, Op::Eq, value);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }

            let compiled = query.compile(style)?;
            debug!("Compiled {} for {}: {}", model, dialect, compiled.sql);
            let output = CompileOutput {
                params: extractor(&compiled),
                sql: compiled.sql,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Aliases compile with their target's placeholder style
fn compile_style(config: &RedframeConfig, dialect: &str) -> ParamStyle {
    ParamStyle::for_dialect(config.alias_target(dialect).unwrap_or(dialect))
}

fn parse_filter(filter: &str) -> anyhow::Result<(&str, Value)> {
    let (column, raw) = filter
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid --where '{}', expected COL=VALUE", filter))?;
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::Text(raw.to_string()));
    Ok((column.trim(), value))
}
