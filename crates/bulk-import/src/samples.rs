use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs;
use std::path::Path;

/// Outcome a sample part is expected to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedStatus {
    /// Imported as a brand new part
    Original,
    /// Looks like an alternate but must still become a new part
    FakeAlternate,
    /// Matches an existing part through its manufacturer part number
    AlternateMpn,
    /// Any other label; kept so the item is reported, and always fails
    Unknown(String),
}

impl ExpectedStatus {
    pub fn parse(label: &str) -> Self {
        match label {
            "original" => ExpectedStatus::Original,
            "fake_alternate" => ExpectedStatus::FakeAlternate,
            "alternate_mpn" => ExpectedStatus::AlternateMpn,
            other => ExpectedStatus::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ExpectedStatus::Original => "original",
            ExpectedStatus::FakeAlternate => "fake_alternate",
            ExpectedStatus::AlternateMpn => "alternate_mpn",
            ExpectedStatus::Unknown(label) => label,
        }
    }
}

impl fmt::Display for ExpectedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleEntry {
    pub part_number: String,
    pub expected: ExpectedStatus,
}

/// Load a YAML (or JSON) sample file, keeping the order of the `Parts` mapping.
pub fn load_samples<P: AsRef<Path>>(path: P) -> Result<Vec<SampleEntry>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read sample file {}", path.display()))?;
    parse_samples(&content).with_context(|| format!("Invalid sample file {}", path.display()))
}

pub fn parse_samples(content: &str) -> Result<Vec<SampleEntry>> {
    let document: serde_yaml::Value = serde_yaml::from_str(content)?;
    let parts = document.get("Parts").context("Missing 'Parts' key")?;
    if parts.is_null() {
        return Ok(Vec::new());
    }
    let parts = parts
        .as_mapping()
        .context("'Parts' must map part numbers to expected statuses")?;

    let mut samples = Vec::with_capacity(parts.len());
    for (key, value) in parts {
        // Numeric-looking part numbers (e.g. LCSC codes without the C) load as numbers
        let part_number = match key {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Number(n) => n.to_string(),
            other => bail!("Unsupported part number key: {other:?}"),
        };
        let Some(label) = value.as_str() else {
            bail!("Status for '{part_number}' must be a string");
        };
        samples.push(SampleEntry {
            part_number,
            expected: ExpectedStatus::parse(label),
        });
    }
    Ok(samples)
}
