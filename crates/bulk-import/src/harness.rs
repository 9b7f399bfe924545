//! Preflight, import loop and cleanup for one verification run.

use anyhow::{Context, Result};
use bulk_import_api::{
    ApiError, DeleteOutcome, Mapping, PartServer, Supplier, SupplierApi, supplier_search,
    translate_supplier_to_form,
};
use std::io::Write;

use crate::check::{ResultLog, check_result};
use crate::console::Console;
use crate::samples::SampleEntry;

/// Exit code for any failed check, item or deletion
pub const EXIT_FAILURE: i32 = -1;

/// Fixed for the whole run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Supplier every sample part number is looked up with
    pub supplier: Supplier,
    pub enable_inventree: bool,
    pub enable_delete: bool,
    /// Skip the confirmation prompt before deleting
    pub auto_delete: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            supplier: Supplier::DigiKey,
            enable_inventree: true,
            enable_delete: false,
            auto_delete: false,
        }
    }
}

/// External APIs the run talks to
pub struct Services<'a> {
    /// Checked in order during preflight
    pub suppliers: &'a [Box<dyn SupplierApi>],
    pub server: &'a mut dyn PartServer,
    pub mapping: &'a Mapping,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub results: ResultLog,
}

/// What the server reported for one sample part
#[derive(Debug, Default)]
struct Observed {
    new_part: bool,
    pk: u64,
}

pub fn run<W: Write>(
    config: &RunConfig,
    samples: &[SampleEntry],
    services: Services<'_>,
    console: &mut Console<W>,
    confirm: &mut dyn FnMut() -> bool,
) -> Result<RunOutcome> {
    let Services {
        suppliers,
        server,
        mapping,
    } = services;
    let mut outcome = RunOutcome {
        exit_code: 0,
        results: ResultLog::new(),
    };

    if !preflight_suppliers(suppliers, console)? {
        outcome.exit_code = EXIT_FAILURE;
        return Ok(outcome);
    }

    let api = suppliers
        .iter()
        .find(|s| s.supplier() == config.supplier)
        .with_context(|| format!("No {} client configured", config.supplier))?;

    if config.enable_inventree {
        console.line("")?;
        console.status("[MAIN]\tConnecting to InvenTree")?;
        if let Err(e) = server.connect() {
            console.fail()?;
            log::error!("InvenTree connection failed: {e}");
            outcome.exit_code = EXIT_FAILURE;
            return Ok(outcome);
        }
        console.pass()?;

        console.line("")?;
        console.line("[MAIN]\tImporting Parts")?;

        for sample in samples {
            console.status(&format!(
                "[INFO]\tChecking \"{}\" ({})",
                sample.part_number, sample.expected
            ))?;

            let (observed, error) = match import_part(&**api, &*server, mapping, sample) {
                Ok(observed) => (observed, None),
                Err(e) => (Observed::default(), Some(e)),
            };
            let passed = error.is_none() && check_result(&sample.expected, observed.new_part);
            outcome
                .results
                .record(&sample.part_number, observed.pk, passed);

            if passed {
                console.pass()?;
            } else {
                console.fail()?;
                outcome.exit_code = EXIT_FAILURE;
                if let Some(e) = &error {
                    console.line(&format!("[DBUG]\terror = {e}"))?;
                }
                console.line(&format!("[DBUG]\tinventree_result = {passed}"))?;
                console.line(&format!("[DBUG]\tnew_part = {}", observed.new_part))?;
                console.line(&format!("[DBUG]\tpart_pk = {}", observed.pk))?;
            }
        }

        console.line(&format!(
            "[MAIN]\t{} passed, {} failed",
            outcome.results.passed(),
            outcome.results.failed()
        ))?;
    }

    if config.enable_delete
        && !outcome.results.is_empty()
        && !cleanup(config, &*server, &outcome.results, console, confirm)?
    {
        outcome.exit_code = EXIT_FAILURE;
    }

    Ok(outcome)
}

/// Run every supplier self-test, stopping at the first failure.
fn preflight_suppliers<W: Write>(
    suppliers: &[Box<dyn SupplierApi>],
    console: &mut Console<W>,
) -> Result<bool> {
    for api in suppliers {
        let supplier = api.supplier();
        console.status(&format!("[MAIN]\t{supplier} API Test"))?;
        match api.test_api() {
            Ok(()) => console.pass()?,
            Err(e) => {
                console.fail()?;
                log::error!("{supplier} API test failed: {e}");
                if supplier == Supplier::DigiKey {
                    console.line("[INFO]\tFailed to get Digi-Key API token, aborting.")?;
                }
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Look up, translate and create (or match) one sample part.
fn import_part(
    api: &dyn SupplierApi,
    server: &dyn PartServer,
    mapping: &Mapping,
    sample: &SampleEntry,
) -> Result<Observed, ApiError> {
    let info = supplier_search(api, mapping, &sample.part_number)?;
    let mut form = translate_supplier_to_form(api.supplier(), &info);
    form.merge_classification(&info);

    if form.is_empty() {
        log::warn!("{}: supplier returned no part data", sample.part_number);
        return Ok(Observed::default());
    }

    let categories = server.get_categories(&form)?;
    if !categories.is_resolved() {
        log::warn!(
            "{}: category {:?} / {:?} not found in InvenTree",
            sample.part_number,
            form.category,
            form.subcategory
        );
        return Ok(Observed::default());
    }

    let created = server.create_part(&form, &categories)?;
    log::debug!(
        "{}: new_part={} pk={}",
        sample.part_number,
        created.new_part,
        created.pk
    );
    Ok(Observed {
        new_part: created.new_part,
        pk: created.pk,
    })
}

/// Delete the parts this run created. Returns `false` if any deletion failed.
fn cleanup<W: Write>(
    config: &RunConfig,
    server: &dyn PartServer,
    results: &ResultLog,
    console: &mut Console<W>,
    confirm: &mut dyn FnMut() -> bool,
) -> Result<bool> {
    if config.auto_delete {
        console.line("")?;
    } else if !confirm() {
        console.line("[INFO]\tDeletion skipped, test parts were kept")?;
        return Ok(true);
    }

    console.status("[MAIN]\tDeleting InvenTree test parts")?;
    let mut errors = 0;
    for pk in results.to_delete() {
        if let DeleteOutcome::Failed(reason) = server.delete_part(pk) {
            log::warn!("Failed to delete part {pk}: {reason}");
            errors += 1;
        }
    }

    console.result(errors == 0)?;
    Ok(errors == 0)
}
