//! Format command implementation.

use inkvar_core::config::types::ResolvedConfig;
use inkvar_core::format::format_value;
use inkvar_core::variables::Value;

use crate::FormatArgs;

pub fn run(rc: &ResolvedConfig, args: &FormatArgs) {
    let spec = args.spec.as_deref().unwrap_or(&rc.display.default_format);
    match format_value(&Value::Number(args.value), spec) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
