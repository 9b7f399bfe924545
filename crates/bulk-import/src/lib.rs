//! Bulk import verification: look up sample part numbers at a supplier,
//! import them into InvenTree and check each outcome against the expected
//! status from the sample file.

pub mod check;
pub mod console;
pub mod harness;
pub mod report;
pub mod samples;

pub use check::{ImportRecord, ResultLog, check_result};
pub use console::Console;
pub use harness::{EXIT_FAILURE, RunConfig, RunOutcome, Services, run};
pub use samples::{ExpectedStatus, SampleEntry, load_samples, parse_samples};
