//! Shared output formatting for the variable table.

use inkvar_core::format::{format_value, resolve_spec};
use inkvar_core::variables::{Variable, VariableTable};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};
use tracing::warn;

/// Row for the variables table.
#[derive(Tabled)]
struct VariableRow {
    #[tabled(rename = "Variable")]
    address: String,
    #[tabled(rename = "Type")]
    var_type: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Formatted variable for JSON output.
#[derive(Debug, Serialize)]
pub struct VariableOutput<'a> {
    pub id: &'a str,
    pub scope: &'a str,
    pub name: &'a str,
    #[serde(rename = "type")]
    pub var_type: &'static str,
    pub derived: bool,
    pub value: &'a inkvar_core::variables::Value,
    pub display: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<&'a str>,
}

/// Render a variable's value with its own format, falling back to `default_format`.
fn display_value(var: &Variable, default_format: &str) -> String {
    let spec = resolve_spec(None, var.format.as_deref(), default_format);
    format_value(&var.value, spec).unwrap_or_else(|e| {
        warn!(id = %var.id, error = %e, "bad format, showing raw value");
        var.value.to_string()
    })
}

pub fn print_table(table: &VariableTable, default_format: &str) {
    if table.is_empty() {
        println!("(no variables)");
        return;
    }

    let rows: Vec<VariableRow> = table
        .iter()
        .map(|var| {
            let mut value = display_value(var, default_format);
            if let Some(ref err) = var.error {
                value.push_str(&format!(" (error: {})", first_line(err)));
            }
            VariableRow {
                address: format!("{}.{}", var.scope, var.name),
                var_type: var.var_type.to_string(),
                value,
                formula: var.value_function.clone().unwrap_or_default(),
                description: var.description.clone().unwrap_or_default(),
            }
        })
        .collect();

    let out = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{out}");
}

pub fn print_json(table: &VariableTable, default_format: &str) {
    let rows: Vec<VariableOutput<'_>> = table
        .iter()
        .map(|var| VariableOutput {
            id: &var.id,
            scope: &var.scope,
            name: &var.name,
            var_type: var.var_type.as_str(),
            derived: var.derived,
            value: &var.value,
            display: display_value(var, default_format),
            error: var.error.as_deref(),
            formula: var.value_function.as_deref(),
        })
        .collect();

    match serde_json::to_string_pretty(&rows) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            std::process::exit(1);
        }
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or(s)
}
