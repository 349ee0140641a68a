//! Trellis CLI - compile semantic models to warehouse SQL.
//!
//! Usage:
//!   trellis compile <model.yaml> --query <query.json> [--dialect <name>]
//!   trellis validate <model.yaml>
//!   trellis dialects

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use trellis::compile::compile;
use trellis::model::SemanticModel;
use trellis::semantic::query::QueryObject;
use trellis::sql::Dialect;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "A semantic model compiler that generates multi-dialect warehouse SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query against a model and print the SQL
    Compile {
        /// Path to the model YAML
        model: PathBuf,

        /// Path to the query JSON
        #[arg(short, long)]
        query: PathBuf,

        /// Target dialect
        #[arg(short, long, default_value = "postgres")]
        dialect: String,
    },

    /// Validate a model and print every issue found
    Validate {
        /// Path to the model YAML
        model: PathBuf,
    },

    /// List registered dialect names
    Dialects,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            model,
            query,
            dialect,
        } => run_compile(&model, &query, &dialect),
        Commands::Validate { model } => run_validate(&model),
        Commands::Dialects => {
            for name in Dialect::names() {
                println!("{}", name);
            }
            ExitCode::SUCCESS
        }
    }
}

fn run_compile(model_path: &PathBuf, query_path: &PathBuf, dialect: &str) -> ExitCode {
    let model = match load_model(model_path) {
        Ok(model) => model,
        Err(code) => return code,
    };

    let issues = model.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("{}", issue);
        }
        return ExitCode::FAILURE;
    }

    let query_text = match fs::read_to_string(query_path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", query_path.display(), err);
            return ExitCode::FAILURE;
        }
    };
    let query: QueryObject = match serde_json::from_str(&query_text) {
        Ok(query) => query,
        Err(err) => {
            eprintln!("error: invalid query JSON: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match compile(&model, &query, dialect) {
        Ok(output) => {
            println!("{}", output.sql);
            for warning in &output.warnings {
                eprintln!("warning: {}", warning);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_validate(model_path: &PathBuf) -> ExitCode {
    let model = match load_model(model_path) {
        Ok(model) => model,
        Err(code) => return code,
    };

    let issues = model.validate();
    if issues.is_empty() {
        println!("ok: model is valid");
        ExitCode::SUCCESS
    } else {
        for issue in &issues {
            eprintln!("{}", issue);
        }
        eprintln!("{} issue(s) found", issues.len());
        ExitCode::FAILURE
    }
}

fn load_model(path: &PathBuf) -> Result<SemanticModel, ExitCode> {
    let text = fs::read_to_string(path).map_err(|err| {
        eprintln!("error: cannot read {}: {}", path.display(), err);
        ExitCode::FAILURE
    })?;
    SemanticModel::from_yaml_str(&text).map_err(|err| {
        eprintln!("error: {}", err);
        ExitCode::FAILURE
    })
}
