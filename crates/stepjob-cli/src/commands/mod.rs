//! CLI command implementations

pub mod classify;
pub mod doctor;
pub mod json_output;
pub mod marshal;
pub mod run;
