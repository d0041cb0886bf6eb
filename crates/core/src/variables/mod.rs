//! The variable store's data model and reducer.
//!
//! A [`VariableTable`] maps ids to [`Variable`]s. It is only ever changed by
//! [`reduce`], which takes the current table and an [`Action`] and returns
//! the next table:
//!
//! - `Define` inserts (or overwrites) a variable after checking its scope and
//!   name against the allowed character set.
//! - `Remove` deletes a variable; removing a missing id is a no-op.
//! - `UpdateValue` writes a literal variable's value; it fails for unknown
//!   ids and for derived variables.
//! - `ApplyResults` merges evaluation output into derived variables, skipping
//!   ids the table does not know.
//!
//! # Example
//!
//! ```rust
//! use inkvar_core::variables::{Action, Value, VarType, VariableDefinition, VariableTable, reduce};
//!
//! let table = VariableTable::new();
//! let def = VariableDefinition::new("a", "s", "x", VarType::Number);
//! let table = reduce(&table, &Action::Define(def)).unwrap();
//! let table = reduce(&table, &Action::update_value("a", 5.0)).unwrap();
//! assert_eq!(table.get("a").unwrap().value, Value::Number(5.0));
//! ```

pub mod current;
pub mod errors;
pub mod reducer;
pub mod types;
pub mod validation;

pub use current::{RawResult, include_current_value, normalize, unpack_current};
pub use errors::{StoreError, StoreResult};
pub use reducer::{Action, Results, reduce};
pub use types::{Value, VarType, Variable, VariableDefinition, VariableTable};
pub use validation::{is_valid_name, is_valid_scope, test_scope_and_name};
