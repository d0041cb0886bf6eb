use inkvar_core::config::loader::{ConfigError, default_config_path};
use inkvar_core::config::types::ResolvedConfig;
use std::path::Path;

pub fn run(config: Option<&Path>, loaded: Result<ResolvedConfig, ConfigError>) {
    match loaded {
        Ok(rc) => {
            println!("OK   inkvar doctor");
            println!(
                "path: {}",
                rc.source
                    .as_ref()
                    .map_or_else(|| "(defaults)".to_string(), |p| p.display().to_string())
            );
            println!("core: {}", inkvar_core::doctor_stub());
            println!("display.default_format: {}", rc.display.default_format);
            println!(
                "range: min={} max={} step={} sensitivity={}",
                rc.range.min, rc.range.max, rc.range.step, rc.range.sensitivity
            );
            println!("scripting.memory_limit: {}", rc.sandbox.memory_limit);
            println!("scripting.instruction_limit: {}", rc.sandbox.instruction_limit);
            println!("logging.level: {}", rc.logging.level);
            println!(
                "logging.file: {}",
                rc.logging
                    .file
                    .as_ref()
                    .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
            );
        }
        Err(e) => {
            println!("FAIL inkvar doctor");
            println!("{e}");
            if config.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}
