//! Evaluation of derived variables.
//!
//! Formulas are evaluated outside the reducer by an injected [`Evaluator`].
//! [`evaluate_derived`] walks a table snapshot and produces an
//! `ApplyResults` action; the store only ever sees the results.
//!
//! Any `Fn(&str, &Inputs) -> Result<Value, EvaluationError>` is an
//! evaluator, which keeps tests free of a scripting runtime. The shipped
//! implementation is the sandboxed [`LuaEvaluator`].

pub mod lua;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::store::Store;
use crate::variables::{Action, RawResult, StoreResult, Value, VariableTable, normalize};

pub use lua::{LuaEvaluator, SandboxConfig};

/// Values visible to a formula, keyed by variable name.
pub type Inputs = BTreeMap<String, Value>;

/// Errors produced while evaluating a formula.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// Error from the Lua runtime.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// The formula produced something that is not a scalar.
    #[error("formula returned unsupported {0} value")]
    UnsupportedResult(&'static str),

    /// Evaluator-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Computes a value from a formula and its inputs.
pub trait Evaluator {
    fn evaluate(&self, formula: &str, inputs: &Inputs) -> Result<Value, EvaluationError>;
}

impl<F> Evaluator for F
where
    F: Fn(&str, &Inputs) -> Result<Value, EvaluationError>,
{
    fn evaluate(&self, formula: &str, inputs: &Inputs) -> Result<Value, EvaluationError> {
        self(formula, inputs)
    }
}

/// Evaluate every derived variable in `table`.
///
/// Inputs are the values of all variables sharing the derived variable's
/// scope. Variables are visited in id order and each successful result is
/// visible to formulas evaluated after it. Failures are reported as error
/// results and never stop the pass. Derived variables without a formula are
/// skipped.
#[must_use]
pub fn evaluate_derived(
    table: &VariableTable,
    evaluator: &dyn Evaluator,
) -> BTreeMap<String, RawResult> {
    let mut scopes: BTreeMap<&str, Inputs> = BTreeMap::new();
    for var in table.iter() {
        scopes.entry(var.scope.as_str()).or_default().insert(var.name.clone(), var.value.clone());
    }

    let mut results = BTreeMap::new();
    for var in table.iter().filter(|v| v.derived) {
        let Some(formula) = var.value_function.as_deref() else {
            continue;
        };
        let inputs = scopes.entry(var.scope.as_str()).or_default();
        let raw = match evaluator.evaluate(formula, inputs) {
            Ok(value) => {
                inputs.insert(var.name.clone(), normalize(var.var_type, Some(&value)));
                RawResult::ok(value)
            }
            Err(e) => {
                warn!(id = %var.id, formula, error = %e, "formula evaluation failed");
                RawResult::err(e.to_string())
            }
        };
        results.insert(var.id.clone(), raw);
    }
    results
}

/// Run one evaluation pass over the store and apply its results.
///
/// Returns the number of derived variables evaluated.
pub fn refresh_derived(store: &mut Store, evaluator: &dyn Evaluator) -> StoreResult<usize> {
    let results = evaluate_derived(&store.state(), evaluator);
    let count = results.len();
    if count > 0 {
        store.dispatch(Action::apply_results(results))?;
    }
    debug!(count, "evaluation pass complete");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{VarType, VariableDefinition};

    fn double_x(formula: &str, inputs: &Inputs) -> Result<Value, EvaluationError> {
        match formula {
            "x * 2" => inputs
                .get("x")
                .and_then(Value::as_f64)
                .map(|x| Value::Number(x * 2.0))
                .ok_or_else(|| EvaluationError::Failed("x is not a number".into())),
            "y + 1" => inputs
                .get("y")
                .and_then(Value::as_f64)
                .map(|y| Value::Number(y + 1.0))
                .ok_or_else(|| EvaluationError::Failed("y is not a number".into())),
            other => Err(EvaluationError::Failed(format!("unknown formula {other}"))),
        }
    }

    fn store() -> Store {
        let mut store = Store::new();
        for def in [
            VariableDefinition::new("a", "s", "x", VarType::Number).with_value(3.0),
            VariableDefinition::new("b", "s", "y", VarType::Number).derived_from("x * 2"),
            VariableDefinition::new("c", "s", "z", VarType::Number).derived_from("y + 1"),
            VariableDefinition::new("d", "other", "w", VarType::Number).derived_from("x * 2"),
        ] {
            store.dispatch(Action::Define(def)).unwrap();
        }
        store
    }

    #[test]
    fn derived_values_chain_in_id_order() {
        let mut store = store();
        let evaluated = refresh_derived(&mut store, &double_x).unwrap();
        assert_eq!(evaluated, 3);
        assert_eq!(store.find("s", "y").unwrap().value, Value::Number(6.0));
        assert_eq!(store.find("s", "z").unwrap().value, Value::Number(7.0));
    }

    #[test]
    fn inputs_are_scoped() {
        let mut store = store();
        refresh_derived(&mut store, &double_x).unwrap();
        let w = store.find("other", "w").unwrap();
        assert_eq!(w.value, Value::Number(0.0));
        assert_eq!(w.error.as_deref(), Some("x is not a number"));
    }

    #[test]
    fn literal_changes_flow_through_next_pass() {
        let mut store = store();
        refresh_derived(&mut store, &double_x).unwrap();
        store.dispatch(Action::update_value("a", 10.0)).unwrap();
        refresh_derived(&mut store, &double_x).unwrap();
        assert_eq!(store.find("s", "y").unwrap().value, Value::Number(20.0));
        assert_eq!(store.find("s", "z").unwrap().value, Value::Number(21.0));
    }

    #[test]
    fn no_derived_variables_means_no_dispatch() {
        let mut store = Store::new();
        store
            .dispatch(Action::Define(VariableDefinition::new("a", "s", "x", VarType::Number)))
            .unwrap();
        let before = store.state();
        assert_eq!(refresh_derived(&mut store, &double_x).unwrap(), 0);
        assert!(store.state().ptr_eq(&before));
    }
}
