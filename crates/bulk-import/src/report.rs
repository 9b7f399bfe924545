use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::check::ImportRecord;
use crate::harness::RunOutcome;

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub exit_code: i32,
    pub passed: usize,
    pub failed: usize,
    pub results: &'a [ImportRecord],
}

impl<'a> RunReport<'a> {
    pub fn new(outcome: &'a RunOutcome) -> Self {
        Self {
            exit_code: outcome.exit_code,
            passed: outcome.results.passed(),
            failed: outcome.results.failed(),
            results: outcome.results.records(),
        }
    }
}

pub fn write_report(path: &Path, outcome: &RunOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(&RunReport::new(outcome))?;
    fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))
}
