//! CLI library components for the ELISA plate QC engine.

pub mod logging;
