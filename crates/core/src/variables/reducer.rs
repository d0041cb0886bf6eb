//! The variable store reducer.
//!
//! `reduce` folds one [`Action`] into a [`VariableTable`], returning a new
//! table or rejecting the action. It holds no state of its own and performs
//! no I/O.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::current::{RawResult, include_current_value, unpack_current, with_value};
use super::errors::{StoreError, StoreResult};
use super::types::{Value, VariableDefinition, VariableTable};
use super::validation::test_scope_and_name;

/// Evaluation results keyed by variable id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    #[serde(default)]
    pub variables: BTreeMap<String, RawResult>,
}

/// An action dispatched to the store.
///
/// The wire form is tagged by `type`, with the body under `payload`.
/// Unrecognised tags deserialize to [`Action::Unknown`] whatever their
/// payload holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", try_from = "Envelope")]
pub enum Action {
    #[serde(rename = "DEFINE_VARIABLE")]
    Define(VariableDefinition),

    #[serde(rename = "REMOVE_VARIABLE")]
    Remove { id: String },

    #[serde(rename = "UPDATE_VARIABLE_VALUE")]
    UpdateValue { id: String, value: Value },

    #[serde(rename = "RETURN_RESULTS")]
    ApplyResults { results: Results },

    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Wire form read before the tag is known.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct IdPayload {
    id: String,
}

#[derive(Deserialize)]
struct UpdatePayload {
    id: String,
    value: Value,
}

#[derive(Deserialize)]
struct ResultsPayload {
    results: Results,
}

impl TryFrom<Envelope> for Action {
    type Error = serde_json::Error;

    fn try_from(env: Envelope) -> Result<Self, Self::Error> {
        let Envelope { tag, payload } = env;
        Ok(match tag.as_str() {
            "DEFINE_VARIABLE" => Action::Define(serde_json::from_value(payload)?),
            "REMOVE_VARIABLE" => {
                let IdPayload { id } = serde_json::from_value(payload)?;
                Action::Remove { id }
            }
            "UPDATE_VARIABLE_VALUE" => {
                let UpdatePayload { id, value } = serde_json::from_value(payload)?;
                Action::UpdateValue { id, value }
            }
            "RETURN_RESULTS" => {
                let ResultsPayload { results } = serde_json::from_value(payload)?;
                Action::ApplyResults { results }
            }
            _ => {
                trace!(%tag, "unrecognised action type");
                Action::Unknown
            }
        })
    }
}

impl Action {
    /// Short name for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Define(_) => "define",
            Action::Remove { .. } => "remove",
            Action::UpdateValue { .. } => "update_value",
            Action::ApplyResults { .. } => "apply_results",
            Action::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn update_value(id: impl Into<String>, value: impl Into<Value>) -> Self {
        Action::UpdateValue { id: id.into(), value: value.into() }
    }

    #[must_use]
    pub fn remove(id: impl Into<String>) -> Self {
        Action::Remove { id: id.into() }
    }

    #[must_use]
    pub fn apply_results(variables: BTreeMap<String, RawResult>) -> Self {
        Action::ApplyResults { results: Results { variables } }
    }
}

/// Apply `action` to `table`.
///
/// Unhandled actions return a reference-equal table. Errors leave `table`
/// untouched since it is never mutated.
pub fn reduce(table: &VariableTable, action: &Action) -> StoreResult<VariableTable> {
    match action {
        Action::Define(def) => {
            if !test_scope_and_name(&def.scope, &def.name) {
                return Err(StoreError::Validation {
                    scope: def.scope.clone(),
                    name: def.name.clone(),
                });
            }
            let mut entries = table.to_entries();
            entries.insert(def.id.clone(), Arc::new(include_current_value(def)));
            debug!(id = %def.id, scope = %def.scope, name = %def.name, "defined variable");
            Ok(VariableTable::from_entries(entries))
        }
        Action::Remove { id } => {
            if !table.contains(id) {
                return Ok(table.clone());
            }
            let mut entries = table.to_entries();
            entries.remove(id);
            debug!(%id, "removed variable");
            Ok(VariableTable::from_entries(entries))
        }
        Action::UpdateValue { id, value } => {
            let variable = table.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
            if variable.derived {
                return Err(StoreError::InvalidOperation(id.clone()));
            }
            let mut entries = table.to_entries();
            entries.insert(id.clone(), Arc::new(with_value(variable, value)));
            trace!(%id, ?value, "updated variable value");
            Ok(VariableTable::from_entries(entries))
        }
        Action::ApplyResults { results } => {
            let mut entries = table.to_entries();
            for (id, raw) in &results.variables {
                match entries.get_mut(id) {
                    Some(slot) => *slot = Arc::new(unpack_current(&**slot, raw)),
                    None => trace!(%id, "skipping result for unknown variable"),
                }
            }
            Ok(VariableTable::from_entries(entries))
        }
        Action::Unknown => Ok(table.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::types::VarType;

    fn define(table: &VariableTable, def: VariableDefinition) -> VariableTable {
        reduce(table, &Action::Define(def)).unwrap()
    }

    fn seeded() -> VariableTable {
        let t = define(&VariableTable::new(), VariableDefinition::new("a", "s", "x", VarType::Number));
        let t = define(&t, VariableDefinition::new("b", "s", "label", VarType::String).with_value("hi"));
        define(&t, VariableDefinition::new("c", "s", "y", VarType::Number).derived_from("x * 2"))
    }

    #[test]
    fn define_update_remove_walkthrough() {
        let t = define(&VariableTable::new(), VariableDefinition::new("a", "s", "x", VarType::Number));
        let a = t.get("a").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!((a.scope.as_str(), a.name.as_str()), ("s", "x"));
        assert_eq!(a.value, Value::Number(0.0));
        assert!(!a.derived);

        let t = reduce(&t, &Action::update_value("a", 5.0)).unwrap();
        assert_eq!(t.get("a").unwrap().value, Value::Number(5.0));

        let t = reduce(&t, &Action::remove("a")).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn define_with_bad_name_is_rejected() {
        let empty = VariableTable::new();
        let err = reduce(
            &empty,
            &Action::Define(VariableDefinition::new("a", "s", "bad;name", VarType::Number)),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
        assert!(empty.is_empty());
    }

    #[test]
    fn define_overwrites_existing_id() {
        let t = seeded();
        let t = define(&t, VariableDefinition::new("a", "s", "z", VarType::Boolean));
        let a = t.get("a").unwrap();
        assert_eq!(a.name, "z");
        assert_eq!(a.value, Value::Bool(false));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn remove_missing_is_idempotent() {
        let t = seeded();
        let once = reduce(&t, &Action::remove("nope")).unwrap();
        let twice = reduce(&once, &Action::remove("nope")).unwrap();
        assert_eq!(once, twice);
        assert!(once.ptr_eq(&t));
    }

    #[test]
    fn update_missing_is_not_found() {
        for table in [VariableTable::new(), seeded()] {
            let err = reduce(&table, &Action::update_value("missing", 1.0)).unwrap_err();
            assert_eq!(err, StoreError::NotFound("missing".into()));
        }
    }

    #[test]
    fn update_derived_is_invalid() {
        let err = reduce(&seeded(), &Action::update_value("c", 3.0)).unwrap_err();
        assert_eq!(err, StoreError::InvalidOperation("c".into()));
    }

    #[test]
    fn update_leaves_other_entries_shared() {
        let t = seeded();
        let next = reduce(&t, &Action::update_value("a", 7.0)).unwrap();
        assert!(Arc::ptr_eq(t.get("b").unwrap(), next.get("b").unwrap()));
        assert!(Arc::ptr_eq(t.get("c").unwrap(), next.get("c").unwrap()));
        assert_eq!(t.get("a").unwrap().value, Value::Number(0.0));
        assert_eq!(next.get("a").unwrap().value, Value::Number(7.0));
    }

    #[test]
    fn update_normalizes_by_type() {
        let next = reduce(&seeded(), &Action::update_value("b", 12.0)).unwrap();
        assert_eq!(next.get("b").unwrap().value, Value::String("12".into()));
    }

    #[test]
    fn apply_results_skips_unknown_and_untouched() {
        let t = seeded();
        let mut vars = BTreeMap::new();
        vars.insert("c".to_string(), RawResult::ok(10.0));
        vars.insert("ghost".to_string(), RawResult::ok(1.0));
        let next = reduce(&t, &Action::apply_results(vars)).unwrap();

        assert_eq!(next.ids().collect::<Vec<_>>(), t.ids().collect::<Vec<_>>());
        assert_eq!(next.get("c").unwrap().value, Value::Number(10.0));
        assert!(Arc::ptr_eq(t.get("a").unwrap(), next.get("a").unwrap()));
        assert!(Arc::ptr_eq(t.get("b").unwrap(), next.get("b").unwrap()));
    }

    #[test]
    fn unknown_action_is_identity() {
        let t = seeded();
        let next = reduce(&t, &Action::Unknown).unwrap();
        assert!(t.ptr_eq(&next));
    }

    #[test]
    fn actions_parse_from_wire_form() {
        let json = r#"[
            {"type": "DEFINE_VARIABLE", "payload": {"id": "a", "scope": "s", "name": "x", "type": "number", "value": 3}},
            {"type": "UPDATE_VARIABLE_VALUE", "payload": {"id": "a", "value": 4}},
            {"type": "RETURN_RESULTS", "payload": {"results": {"variables": {"a": {"value": 1}, "b": {"error": "boom"}}}}},
            {"type": "REMOVE_VARIABLE", "payload": {"id": "a"}},
            {"type": "SOMETHING_ELSE"}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(json).unwrap();
        let kinds: Vec<_> = actions.iter().map(Action::kind).collect();
        assert_eq!(kinds, ["define", "update_value", "apply_results", "remove", "unknown"]);
        assert_eq!(actions[1], Action::update_value("a", 4.0));
    }

    #[test]
    fn unrecognised_action_with_payload_is_identity() {
        let json = r#"[
            {"type": "SET_THEME", "payload": {"theme": "dark"}},
            {"type": "SCROLL_TO", "payload": [1, 2, 3]},
            {"type": "PING", "payload": null}
        ]"#;
        let actions: Vec<Action> = serde_json::from_str(json).unwrap();
        assert_eq!(actions, [Action::Unknown, Action::Unknown, Action::Unknown]);

        let t = seeded();
        for action in &actions {
            assert!(reduce(&t, action).unwrap().ptr_eq(&t));
        }
    }

    #[test]
    fn known_action_with_bad_payload_is_rejected() {
        let err = serde_json::from_str::<Action>(r#"{"type": "REMOVE_VARIABLE", "payload": {}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("missing field `id`"));
        assert!(serde_json::from_str::<Action>(r#"{"payload": {"id": "a"}}"#).is_err());
    }
}
