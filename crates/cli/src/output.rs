//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use solubility_lib::SolubilityClass;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table of rows, or a note when there are none
pub fn print_table<T: Tabled>(items: &[T], empty_message: &str) {
    if items.is_empty() {
        println!("{}", empty_message.yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a LogS value
pub fn format_log_s(log_s: f64) -> String {
    format!("{:.3}", log_s)
}

/// Format a molar solubility in scientific notation
pub fn format_molar(mol_per_l: f64) -> String {
    format!("{:.3e}", mol_per_l)
}

/// Color a solubility class from green (soluble) to red (insoluble)
pub fn color_class(class: SolubilityClass) -> String {
    let label = class.as_str();
    match class {
        SolubilityClass::HighlySoluble => label.green().bold().to_string(),
        SolubilityClass::Soluble => label.green().to_string(),
        SolubilityClass::SlightlySoluble => label.yellow().to_string(),
        SolubilityClass::Insoluble => label.red().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_log_s(-1.23456), "-1.235");
        assert_eq!(format_molar(0.001), "1.000e-3");
    }

    #[test]
    fn test_color_class_keeps_label() {
        colored::control::set_override(false);
        assert_eq!(color_class(SolubilityClass::Insoluble), "insoluble");
    }
}
