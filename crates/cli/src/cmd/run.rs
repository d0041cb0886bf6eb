//! Run command implementation.

use inkvar_core::config::types::ResolvedConfig;
use inkvar_core::evaluation::{refresh_derived, LuaEvaluator};
use inkvar_core::store::Store;
use tracing::{debug, info};

use crate::cmd::output;
use crate::session;
use crate::{OutputFormat, RunArgs};

pub fn run(rc: &ResolvedConfig, args: &RunArgs) {
    let actions = match session::load(&args.session) {
        Ok(actions) => actions,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!(path = %args.session.display(), count = actions.len(), "replaying session");

    let evaluator = if args.no_eval {
        None
    } else {
        match LuaEvaluator::new(&rc.sandbox) {
            Ok(ev) => Some(ev),
            Err(e) => {
                eprintln!("Error starting formula evaluator: {}", e);
                std::process::exit(1);
            }
        }
    };

    let mut store = Store::new();
    let mut failures = 0usize;

    for (i, action) in actions.into_iter().enumerate() {
        let kind = action.kind();
        if let Err(e) = store.dispatch(action) {
            eprintln!("action {} ({}) rejected: {}", i + 1, kind, e);
            failures += 1;
            if args.keep_going {
                continue;
            }
            std::process::exit(1);
        }

        if let Some(ref ev) = evaluator {
            match refresh_derived(&mut store, ev) {
                Ok(n) => debug!(step = i + 1, evaluated = n, "derived variables refreshed"),
                Err(e) => {
                    eprintln!("Error applying results: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    let table = store.state();
    match args.output {
        OutputFormat::Table => output::print_table(&table, &rc.display.default_format),
        OutputFormat::Json => output::print_json(&table, &rc.display.default_format),
    }

    if failures > 0 {
        eprintln!("{} action(s) rejected", failures);
        std::process::exit(1);
    }
}
