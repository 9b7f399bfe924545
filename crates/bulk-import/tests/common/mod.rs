//! In-process stand-ins for the supplier APIs and the InvenTree server.

#![allow(dead_code)]

use bulk_import::console::Console;
use bulk_import::harness::{self, RunConfig, RunOutcome, Services};
use bulk_import::samples::parse_samples;
use bulk_import_api::{
    ApiConfig, ApiError, Categories, CreatedPart, DeleteOutcome, Mapping, PartForm, PartServer,
    Result, Supplier, SupplierApi, SupplierPart,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub struct FakeSupplier {
    pub supplier: Supplier,
    pub healthy: bool,
    pub parts: HashMap<String, SupplierPart>,
    pub searches: RefCell<Vec<String>>,
}

impl FakeSupplier {
    pub fn new(supplier: Supplier) -> Self {
        Self {
            supplier,
            healthy: true,
            parts: HashMap::new(),
            searches: RefCell::new(Vec::new()),
        }
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn with_part(mut self, part_number: &str, mpn: &str, category_tree: &[&str]) -> Self {
        self.parts.insert(
            part_number.to_string(),
            SupplierPart {
                supplier_part_number: part_number.to_string(),
                manufacturer_name: "Texas Instruments".to_string(),
                manufacturer_part_number: mpn.to_string(),
                description: format!("{mpn} test part"),
                category_tree: category_tree.iter().map(|c| c.to_string()).collect(),
                ..Default::default()
            },
        );
        self
    }
}

impl SupplierApi for FakeSupplier {
    fn supplier(&self) -> Supplier {
        self.supplier
    }

    fn test_api(&self) -> Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(ApiError::MissingConfig("test credentials"))
        }
    }

    fn search(&self, part_number: &str) -> Result<SupplierPart> {
        self.searches.borrow_mut().push(part_number.to_string());
        self.parts
            .get(part_number)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                service: "Fake",
                part_number: part_number.to_string(),
            })
    }
}

/// Creates parts with increasing pks starting at `next_pk`.
/// A repeated MPN matches the earlier part.
pub struct FakeServer {
    pub reachable: bool,
    pub connected: bool,
    pub categories: HashMap<String, u64>,
    pub existing: RefCell<HashMap<String, u64>>,
    pub next_pk: Cell<u64>,
    pub created: RefCell<Vec<u64>>,
    pub deleted: RefCell<Vec<u64>>,
    pub undeletable: HashSet<u64>,
    /// MPNs whose category lookup errors
    pub broken_categories: HashSet<String>,
    /// MPNs whose creation errors
    pub broken_creates: HashSet<String>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self {
            reachable: true,
            connected: false,
            categories: [("Integrated Circuits", 1), ("Timers", 2)]
                .into_iter()
                .map(|(name, pk)| (name.to_string(), pk))
                .collect(),
            existing: RefCell::new(HashMap::new()),
            next_pk: Cell::new(5),
            created: RefCell::new(Vec::new()),
            deleted: RefCell::new(Vec::new()),
            undeletable: HashSet::new(),
            broken_categories: HashSet::new(),
            broken_creates: HashSet::new(),
        }
    }

    pub fn with_existing(self, mpn: &str, pk: u64) -> Self {
        self.existing.borrow_mut().insert(mpn.to_string(), pk);
        self
    }
}

impl PartServer for FakeServer {
    fn connect(&mut self) -> Result<()> {
        if !self.reachable {
            return Err(ApiError::NotConnected);
        }
        self.connected = true;
        Ok(())
    }

    fn get_categories(&self, form: &PartForm) -> Result<Categories> {
        if self.broken_categories.contains(&form.manufacturer_part_number) {
            return Err(ApiError::NotConnected);
        }
        let lookup = |name: &Option<String>| {
            name.as_ref()
                .and_then(|n| self.categories.get(n))
                .copied()
        };
        Ok(Categories {
            category: lookup(&form.category),
            subcategory: lookup(&form.subcategory),
        })
    }

    fn create_part(&self, form: &PartForm, _categories: &Categories) -> Result<CreatedPart> {
        let mpn = &form.manufacturer_part_number;
        if self.broken_creates.contains(mpn) {
            return Err(ApiError::Decode {
                service: "InvenTree",
                reason: format!("no pk for {mpn}"),
            });
        }
        if let Some(pk) = self.existing.borrow().get(mpn) {
            return Ok(CreatedPart {
                new_part: false,
                pk: *pk,
                data: serde_json::json!({ "pk": pk }),
            });
        }

        let pk = self.next_pk.get();
        self.next_pk.set(pk + 1);
        self.existing.borrow_mut().insert(mpn.clone(), pk);
        self.created.borrow_mut().push(pk);
        Ok(CreatedPart {
            new_part: true,
            pk,
            data: serde_json::json!({ "pk": pk, "name": form.name }),
        })
    }

    fn delete_part(&self, pk: u64) -> DeleteOutcome {
        if self.undeletable.contains(&pk) {
            return DeleteOutcome::Failed(format!("part {pk} is locked"));
        }
        self.deleted.borrow_mut().push(pk);
        DeleteOutcome::Deleted
    }
}

pub fn mapping() -> Mapping {
    let config = ApiConfig::from_yaml(
        r#"
categories:
  Integrated Circuits:
    Timers:
      - Timers & Support Products
  Connectors:
    Headers: []
"#,
    )
    .unwrap();
    Mapping::from_config(&config)
}

/// Digi-Key, Mouser and LCSC fakes, all healthy, with `digikey` in front.
pub fn suppliers(digikey: FakeSupplier) -> Vec<Box<dyn SupplierApi>> {
    vec![
        Box::new(digikey),
        Box::new(FakeSupplier::new(Supplier::Mouser)),
        Box::new(FakeSupplier::new(Supplier::Lcsc)),
    ]
}

pub struct Run {
    pub outcome: RunOutcome,
    pub output: String,
    pub prompted: usize,
}

pub fn run_with(
    config: &RunConfig,
    samples_yaml: &str,
    suppliers: &[Box<dyn SupplierApi>],
    server: &mut FakeServer,
    confirm_answer: bool,
) -> Run {
    let samples = parse_samples(samples_yaml).unwrap();
    let mapping = mapping();
    let mut console = Console::new(Vec::new(), false);
    let mut prompted = 0;
    let mut confirm = || {
        prompted += 1;
        confirm_answer
    };

    let outcome = harness::run(
        config,
        &samples,
        Services {
            suppliers,
            server,
            mapping: &mapping,
        },
        &mut console,
        &mut confirm,
    )
    .unwrap();

    Run {
        outcome,
        output: String::from_utf8(console.into_inner()).unwrap(),
        prompted,
    }
}

/// Collapse the fixed-width padding so output can be compared line by line.
pub fn normalize(output: &str) -> String {
    output
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
