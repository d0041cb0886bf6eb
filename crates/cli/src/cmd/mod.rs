pub mod doctor;
pub mod drag;
pub mod format;
pub mod output;
pub mod run;
