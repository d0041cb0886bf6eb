//! Character-set checks for variable scopes and names.
//!
//! Names end up interpolated into formulas as identifiers, so they are held
//! to identifier rules. Scopes may additionally contain `.` and `-` for
//! dotted namespaces.

use regex::Regex;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

static SCOPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("valid regex"));

/// Whether `name` is a valid variable name.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Whether `scope` is a valid scope.
#[must_use]
pub fn is_valid_scope(scope: &str) -> bool {
    SCOPE_RE.is_match(scope)
}

/// Check both parts of a variable's address.
#[must_use]
pub fn test_scope_and_name(scope: &str, name: &str) -> bool {
    is_valid_scope(scope) && is_valid_name(name)
}
