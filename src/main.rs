use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use relmap::attribute_index::JoinStrategy;
use relmap::config::{self, CompilerConfig};
use relmap::relation_catalog::{RelationSchemaConfig, SchemaCompiler};

/// Relmap - resolve association schemas into joined relation headers
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Relation schema file (YAML)
    #[arg(long)]
    schema: PathBuf,

    /// Only print these associations (repeatable)
    #[arg(long = "association")]
    associations: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Join strategy used for association keys (natural or inner)
    #[arg(long)]
    strategy: Option<JoinStrategy>,

    /// Skip header invariant checks after each join
    #[arg(long)]
    no_verify: bool,

    /// Key column assumed when an association does not name one
    #[arg(long)]
    default_primary_key: Option<String>,

    /// Maximum number of associations accepted from one schema
    #[arg(long)]
    max_associations: Option<usize>,

    /// Compiler configuration file (YAML), read instead of RELMAP_* variables
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// CLI values override the base configuration field by field.
    fn overrides(&self, base: &CompilerConfig) -> config::CliConfig {
        config::CliConfig {
            default_primary_key: self
                .default_primary_key
                .clone()
                .unwrap_or_else(|| base.default_primary_key.clone()),
            join_strategy: self.strategy.unwrap_or(base.join_strategy),
            verify_invariants: base.verify_invariants && !self.no_verify,
            max_associations: self.max_associations.unwrap_or(base.max_associations),
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => CompilerConfig::from_yaml_file(path),
        None => CompilerConfig::from_env(),
    };
    let mut config = match base {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    match CompilerConfig::from_cli(cli.overrides(&config)) {
        Ok(overrides) => config.merge(overrides),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }

    let compiled = match RelationSchemaConfig::from_yaml_file(&cli.schema)
        .and_then(|schema| SchemaCompiler::new(&config).compile(&schema))
    {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("Schema error: {}", e);
            std::process::exit(1);
        }
    };

    let reports = match compiled.reports(&cli.associations) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    match cli.format {
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", report);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize output: {}", e);
                std::process::exit(1);
            }
        },
    }
}
