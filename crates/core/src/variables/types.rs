//! Variable data model: values, type tags, variables and the table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A scalar value held by a variable.
///
/// Serialized untagged, so `3`, `"text"`, `true` and `null` map directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    /// Numeric view of the value, if it is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Name of the value's kind, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", display_number(*n)),
            Value::String(s) => f.write_str(s),
        }
    }
}

/// Render a number the way a document author expects: integral values
/// without a trailing `.0`.
pub(crate) fn display_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Type tag selecting how a variable's current value is normalised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    #[default]
    Number,
    String,
    Boolean,
}

impl VarType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::Number => "number",
            VarType::String => "string",
            VarType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a define action: a variable as declared by a component,
/// before its current value has been computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub id: String,
    pub scope: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: VarType,
    #[serde(default)]
    pub derived: bool,
    /// Initial value. Ignored for derived variables once results arrive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Formula source for derived variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VariableDefinition {
    /// A literal (non-derived) definition with no initial value.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        scope: impl Into<String>,
        name: impl Into<String>,
        var_type: VarType,
    ) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
            name: name.into(),
            var_type,
            derived: false,
            value: None,
            value_function: None,
            format: None,
            description: None,
        }
    }

    /// Set the initial value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Mark the definition as derived from `formula`.
    #[must_use]
    pub fn derived_from(mut self, formula: impl Into<String>) -> Self {
        self.derived = true;
        self.value_function = Some(formula.into());
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A variable as stored in the table, with its current value resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub scope: String,
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    pub derived: bool,
    pub value: Value,
    /// Last evaluation error of a derived variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Immutable mapping from variable id to variable.
///
/// Cloning is cheap and yields a reference-equal table. Transitions build a
/// new map but share untouched entries with the previous table, so
/// consumers holding an older snapshot keep seeing it unchanged.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    entries: Arc<BTreeMap<String, Arc<Variable>>>,
}

impl VariableTable {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, Arc<Variable>>) -> Self {
        Self { entries: Arc::new(entries) }
    }

    /// A copy of the underlying map for building the next table.
    pub(crate) fn to_entries(&self) -> BTreeMap<String, Arc<Variable>> {
        (*self.entries).clone()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<Variable>> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Variables in id order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Variable>> {
        self.entries.values()
    }

    #[must_use]
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Find a variable by scope and name.
    #[must_use]
    pub fn find(&self, scope: &str, name: &str) -> Option<&Arc<Variable>> {
        self.entries.values().find(|v| v.scope == scope && v.name == name)
    }

    /// Whether `other` is the very same table value (not merely equal).
    #[must_use]
    pub fn ptr_eq(&self, other: &VariableTable) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl PartialEq for VariableTable {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.entries == other.entries
    }
}

impl Serialize for VariableTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}
