//! Computing and merging a variable's current value.
//!
//! `include_current_value` builds the stored form of a variable from a
//! definition (or an existing variable) plus an optional new value, running
//! the value through the type's normaliser. `unpack_current` merges a raw
//! evaluation result into a derived variable's cached state.

use serde::{Deserialize, Serialize};

use super::types::{Value, VarType, Variable, VariableDefinition, display_number};

/// Raw output of evaluating one derived variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawResult {
    #[must_use]
    pub fn ok(value: impl Into<Value>) -> Self {
        Self { value: Some(value.into()), error: None }
    }

    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self { value: None, error: Some(message.into()) }
    }
}

/// Normalise `value` for a variable of type `var_type`.
///
/// Absent values become the type's default.
#[must_use]
pub fn normalize(var_type: VarType, value: Option<&Value>) -> Value {
    let value = value.unwrap_or(&Value::Null);
    match var_type {
        VarType::Number => Value::Number(to_number(value)),
        VarType::String => Value::String(to_text(value)),
        VarType::Boolean => Value::Bool(to_bool(value)),
    }
}

fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => display_number(*n),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.parse::<f64>().is_ok_and(|n| n != 0.0)
        }
        Value::Null => false,
    }
}

/// Build the stored variable for a definition.
///
/// Derived variables start with their type's default and no error; their
/// real value arrives through evaluation results.
#[must_use]
pub fn include_current_value(def: &VariableDefinition) -> Variable {
    let initial = if def.derived { None } else { def.value.as_ref() };
    Variable {
        id: def.id.clone(),
        scope: def.scope.clone(),
        name: def.name.clone(),
        var_type: def.var_type,
        derived: def.derived,
        value: normalize(def.var_type, initial),
        error: None,
        value_function: def.value_function.clone(),
        format: def.format.clone(),
        description: def.description.clone(),
    }
}

/// A copy of `variable` holding `value`, normalised per its type.
#[must_use]
pub fn with_value(variable: &Variable, value: &Value) -> Variable {
    Variable { value: normalize(variable.var_type, Some(value)), ..variable.clone() }
}

/// Merge an evaluation result into a variable.
///
/// On error the cached value is kept and the error recorded; on success the
/// value is normalised and any previous error cleared.
#[must_use]
pub fn unpack_current(variable: &Variable, raw: &RawResult) -> Variable {
    match &raw.error {
        Some(message) => Variable { error: Some(message.clone()), ..variable.clone() },
        None => Variable {
            value: normalize(variable.var_type, raw.value.as_ref()),
            error: None,
            ..variable.clone()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(VarType::Number, None, Value::Number(0.0))]
    #[case(VarType::Number, Some(Value::Number(2.5)), Value::Number(2.5))]
    #[case(VarType::Number, Some(Value::String(" 42 ".into())), Value::Number(42.0))]
    #[case(VarType::Number, Some(Value::String("abc".into())), Value::Number(0.0))]
    #[case(VarType::Number, Some(Value::Bool(true)), Value::Number(1.0))]
    #[case(VarType::String, None, Value::String(String::new()))]
    #[case(VarType::String, Some(Value::Number(3.0)), Value::String("3".into()))]
    #[case(VarType::String, Some(Value::Number(0.25)), Value::String("0.25".into()))]
    #[case(VarType::String, Some(Value::Bool(false)), Value::String("false".into()))]
    #[case(VarType::Boolean, None, Value::Bool(false))]
    #[case(VarType::Boolean, Some(Value::Number(2.0)), Value::Bool(true))]
    #[case(VarType::Boolean, Some(Value::String("TRUE".into())), Value::Bool(true))]
    #[case(VarType::Boolean, Some(Value::String("no".into())), Value::Bool(false))]
    #[case(VarType::Boolean, Some(Value::String("0".into())), Value::Bool(false))]
    fn normalizes_per_type(
        #[case] var_type: VarType,
        #[case] input: Option<Value>,
        #[case] expected: Value,
    ) {
        assert_eq!(normalize(var_type, input.as_ref()), expected);
    }

    #[test]
    fn derived_definition_ignores_initial_value() {
        let def = VariableDefinition::new("d", "s", "y", VarType::Number)
            .with_value(9.0)
            .derived_from("x * 2");
        let var = include_current_value(&def);
        assert!(var.derived);
        assert_eq!(var.value, Value::Number(0.0));
        assert_eq!(var.value_function.as_deref(), Some("x * 2"));
    }

    #[test]
    fn error_result_keeps_cached_value() {
        let def = VariableDefinition::new("d", "s", "y", VarType::Number).derived_from("x");
        let var = unpack_current(&include_current_value(&def), &RawResult::ok(4.0));
        assert_eq!(var.value, Value::Number(4.0));

        let failed = unpack_current(&var, &RawResult::err("x is nil"));
        assert_eq!(failed.value, Value::Number(4.0));
        assert_eq!(failed.error.as_deref(), Some("x is nil"));

        let recovered = unpack_current(&failed, &RawResult::ok(5.0));
        assert_eq!(recovered.value, Value::Number(5.0));
        assert!(recovered.error.is_none());
    }
}
