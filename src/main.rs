use clap::{Parser, Subcommand};
use dealflow_formula::cli;
use dealflow_formula::core::ReductionKind;
use dealflow_formula::error::FormulaResult;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dealflow")]
#[command(about = "Evaluate, validate and aggregate report formulas over deal records.")]
#[command(long_about = "Dealflow - report formula engine

Formulas are arithmetic over record fields with a fixed function set:
  Operators:  + - * / % ( )   and comparisons > < >= <= = <> (yield 1 or 0)
  Functions:  SUM AVG MIN MAX COUNT IF ABS ROUND FLOOR CEIL
  Synonyms:   amount, probability, expectedValue (= amount * probability / 100)

Evaluation never fails: unknown fields, missing arguments and division by
zero all evaluate to 0.

COMMANDS:
  eval          - Evaluate a formula against one record
  validate      - Check formula syntax (empty input, parenthesis balance)
  aggregate     - Reduce a formula across a record file
  report        - Run a report configuration over a record file
  add-field     - Add a validated calculated field to a report configuration
  remove-field  - Remove a calculated field from a report configuration

EXAMPLES:
  dealflow eval \"amount * probability / 100\" --set amount=1000000 --set probability=50
  dealflow validate \"IF(amount > 1000000, 1, 0)\" \"(1 + 2\"
  dealflow aggregate expected_value deals.json --kind sum
  dealflow report pipeline.yaml deals.json")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against one record
    Eval {
        /// Formula to evaluate
        formula: String,

        /// JSON or YAML file holding a single record
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// Field assignment name=value (repeatable, overrides --record)
        #[arg(short, long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Show the record and validation result
        #[arg(short, long)]
        verbose: bool,
    },

    #[command(long_about = "Validate formulas without evaluating them.

A formula is invalid when it is empty or its parentheses do not balance.
Field names and function arity are not checked.

Exits non-zero when any formula is invalid.")]
    /// Validate formula syntax
    Validate {
        /// Formulas to validate
        #[arg(required = true)]
        formulas: Vec<String>,
    },

    /// Reduce a formula across every record in a file
    Aggregate {
        /// Formula evaluated per record
        formula: String,

        /// JSON or YAML file holding a list of records
        records: PathBuf,

        /// Reduction applied across records
        #[arg(short, long, value_enum, default_value_t = ReductionKind::Sum)]
        kind: ReductionKind,

        /// Show per-record values
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run a report configuration over a record file
    Report {
        /// Report configuration (YAML)
        config: PathBuf,

        /// JSON or YAML file holding a list of records
        records: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    #[command(long_about = "Add a calculated field to a report configuration.

The formula is validated first; an invalid formula is rejected and the
configuration file is left untouched. The file is created if missing.")]
    /// Add a calculated field to a report configuration
    AddField {
        /// Report configuration (YAML)
        config: PathBuf,

        /// Field id (unique within the report)
        #[arg(long)]
        id: String,

        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        /// Formula evaluated per record
        #[arg(short, long)]
        formula: String,
    },

    /// Remove a calculated field from a report configuration
    RemoveField {
        /// Report configuration (YAML)
        config: PathBuf,

        /// Field id to remove
        #[arg(long)]
        id: String,
    },
}

fn main() -> FormulaResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            formula,
            record,
            set,
            verbose,
        } => cli::eval(formula, record, set, verbose),

        Commands::Validate { formulas } => cli::validate(formulas),

        Commands::Aggregate {
            formula,
            records,
            kind,
            verbose,
        } => cli::aggregate(formula, records, kind, verbose),

        Commands::Report {
            config,
            records,
            json,
        } => cli::report(config, records, json),

        Commands::AddField {
            config,
            id,
            name,
            formula,
        } => cli::add_field(config, id, name, formula),

        Commands::RemoveField { config, id } => cli::remove_field(config, id),
    }
}
