use crate::core::{
    aggregate_formula_over_records, evaluate_formula, evaluate_over_records, validate_formula,
    ReductionKind,
};
use crate::error::{FormulaError, FormulaResult};
use crate::records::{load_record, load_records};
use crate::report::ReportConfig;
use crate::types::{CalculatedField, FieldValue, Record};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    let text = format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string();
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

/// Parse `name=value` pairs from the command line into a record
pub fn parse_assignments(assignments: &[String]) -> FormulaResult<Record> {
    let mut record = Record::new();
    for assignment in assignments {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            FormulaError::Parse(format!(
                "Invalid field assignment '{}': expected name=value",
                assignment
            ))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FormulaError::Parse(format!(
                "Invalid field assignment '{}': empty field name",
                assignment
            )));
        }
        record.insert(name, FieldValue::parse_loose(value));
    }
    Ok(record)
}

/// Execute the eval command
pub fn eval(
    formula: String,
    record_file: Option<PathBuf>,
    assignments: Vec<String>,
    verbose: bool,
) -> FormulaResult<()> {
    let mut record = match &record_file {
        Some(path) => load_record(path)?,
        None => Record::new(),
    };
    for (name, value) in parse_assignments(&assignments)?.iter() {
        record.insert(name.clone(), value.clone());
    }

    if verbose {
        println!("{}", "🧮 Evaluating formula".bold().green());
        println!("   Formula: {}", formula.bright_yellow());
        if let Some(path) = &record_file {
            println!("   Record: {}", path.display());
        }
        for (name, value) in record.iter() {
            println!("      {} ({})", name.cyan(), value.type_name());
        }
        let validation = validate_formula(&formula);
        if let Some(error) = validation.error {
            println!("   {} {}", "⚠️ ".yellow(), error.yellow());
        }
        println!();
    }

    let value = evaluate_formula(&formula, &record);
    println!("{}", format_number(value));
    Ok(())
}

/// Execute the validate command
pub fn validate(formulas: Vec<String>) -> FormulaResult<()> {
    println!("{}", "✅ Validating formulas".bold().green());

    let mut invalid = 0;
    for formula in &formulas {
        let validation = validate_formula(formula);
        match validation.error {
            None => println!("   {} {}", "✓".green(), formula),
            Some(error) => {
                invalid += 1;
                println!("   {} {} ({})", "✗".red(), formula, error.red());
            }
        }
    }
    println!();

    if invalid > 0 {
        return Err(FormulaError::Validation(format!(
            "{} of {} formulas invalid",
            invalid,
            formulas.len()
        )));
    }

    println!("{}", "All formulas are valid".green());
    Ok(())
}

/// Execute the aggregate command
pub fn aggregate(
    formula: String,
    records_file: PathBuf,
    kind: ReductionKind,
    verbose: bool,
) -> FormulaResult<()> {
    let records = load_records(&records_file)?;

    if verbose {
        println!("{}", "📊 Aggregating formula".bold().green());
        println!("   Formula: {}", formula.bright_yellow());
        println!("   Records: {} ({})", records.len(), records_file.display());
        println!("   Reduction: {}", kind.to_string().cyan());
        for (i, value) in evaluate_over_records(&formula, &records).iter().enumerate() {
            println!("      [{}] {}", i, format_number(*value));
        }
        println!();
    }

    let value = aggregate_formula_over_records(&formula, &records, kind);
    println!("{}", format_number(value));
    Ok(())
}

/// Execute the report command
pub fn report(config_file: PathBuf, records_file: PathBuf, json: bool) -> FormulaResult<()> {
    let config = ReportConfig::load(&config_file)?;
    let records = load_records(&records_file)?;
    let output = config.run(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", format!("📈 Report: {}", output.report).bold().green());
    println!("   Records: {}", output.record_count);
    println!();

    if !config.calculated_fields.is_empty() {
        println!("{}", "   Calculated fields:".bold().cyan());
        for (i, row) in output.rows.iter().enumerate() {
            let cells: Vec<String> = config
                .calculated_fields
                .iter()
                .map(|f| {
                    let value = row.get(&f.id).copied().unwrap_or(0.0);
                    format!("{}={}", f.name.bright_blue(), format_number(value))
                })
                .collect();
            println!("      [{}] {}", i, cells.join("  "));
        }
        println!();
    }

    if !config.metrics.is_empty() {
        println!("{}", "   Metrics:".bold().cyan());
        for metric in &config.metrics {
            let value = output.metrics.get(&metric.id).copied().unwrap_or(0.0);
            println!(
                "      {} ({}) = {}",
                metric.name.bright_blue(),
                metric.kind,
                format_number(value).bold()
            );
        }
    }

    Ok(())
}

fn load_or_create_config(path: &Path) -> FormulaResult<ReportConfig> {
    if path.exists() {
        ReportConfig::load(path)
    } else {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report");
        Ok(ReportConfig::new(name))
    }
}

/// Execute the add-field command: validate, then persist
pub fn add_field(
    config_file: PathBuf,
    id: String,
    name: Option<String>,
    formula: String,
) -> FormulaResult<()> {
    let mut config = load_or_create_config(&config_file)?;
    let name = name.unwrap_or_else(|| id.clone());

    config.add_calculated_field(CalculatedField::new(id.clone(), name, formula))?;
    config.save(&config_file)?;

    println!(
        "{} Added calculated field {} to {}",
        "✓".green(),
        id.bright_blue().bold(),
        config_file.display()
    );
    Ok(())
}

/// Execute the remove-field command
pub fn remove_field(config_file: PathBuf, id: String) -> FormulaResult<()> {
    let mut config = ReportConfig::load(&config_file)?;
    let removed = config.remove_calculated_field(&id)?;
    config.save(&config_file)?;

    println!(
        "{} Removed calculated field {} ({})",
        "✓".green(),
        removed.id.bright_blue().bold(),
        removed.name
    );
    Ok(())
}
