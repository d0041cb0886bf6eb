//! Configuration file loading.
//!
//! ```toml
//! version = 1
//!
//! [display]
//! default_format = ".2f"
//!
//! [range]
//! min = 0
//! max = 100
//! step = 1
//! sensitivity = 5
//!
//! [scripting]
//! memory_limit = 4194304
//! instruction_limit = 50000
//!
//! [logging]
//! level = "info"
//! file = "~/.local/state/inkvar/inkvar.log"
//! file_level = "debug"
//! ```

pub mod loader;
pub mod types;
