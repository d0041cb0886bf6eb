//! Drag command implementation.
//!
//! Bounds come from the `[range]` config section, with per-flag overrides.

use inkvar_core::config::types::ResolvedConfig;
use inkvar_core::format::format_value;
use inkvar_core::range::{DragSession, RangeSpec};
use inkvar_core::variables::Value;
use tracing::debug;

use crate::DragArgs;

pub fn run(rc: &ResolvedConfig, args: &DragArgs) {
    let spec = RangeSpec {
        min: args.min.unwrap_or(rc.range.min),
        max: args.max.unwrap_or(rc.range.max),
        step: args.step.unwrap_or(rc.range.step),
        sensitivity: args.sensitivity.unwrap_or(rc.range.sensitivity),
    };
    let mut session = match DragSession::start(spec, args.start) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let format = args.spec.as_deref().unwrap_or(&rc.display.default_format);
    for &dx in &args.deltas {
        let value = session.drag(dx);
        debug!(dx, raw = session.raw(), value, "drag step");
        match format_value(&Value::Number(value), format) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
