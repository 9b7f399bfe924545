//! Supplier category and parameter names mapped onto InvenTree's.

use std::collections::BTreeMap;

use crate::config::{ApiConfig, CategoryMap};
use crate::part::{PartInfo, Supplier, SupplierPart};

#[derive(Debug, Clone, Default)]
pub struct Mapping {
    categories: CategoryMap,
    parameters: BTreeMap<String, Vec<String>>,
}

impl Mapping {
    pub fn new(
        categories: CategoryMap,
        parameters: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            categories,
            parameters,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.categories.clone(), config.parameters.clone())
    }

    /// First (category, subcategory) in config order whose keywords or name match any
    /// level of `tree`.
    pub fn find_category(&self, tree: &[String]) -> Option<(String, String)> {
        let matches = |candidate: &str| tree.iter().any(|t| t.eq_ignore_ascii_case(candidate));

        self.categories
            .rules()
            .iter()
            .find(|rule| matches(&rule.subcategory) || rule.keywords.iter().any(|k| matches(k)))
            .map(|rule| (rule.category.clone(), rule.subcategory.clone()))
    }

    /// Rename supplier parameters to InvenTree template names, dropping unmapped ones.
    pub fn map_parameters(&self, raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut mapped = BTreeMap::new();
        for (template, supplier_names) in &self.parameters {
            let value = supplier_names
                .iter()
                .find_map(|name| raw.get(name))
                .filter(|v| !v.trim().is_empty() && v.as_str() != "-");
            if let Some(value) = value {
                mapped.insert(template.clone(), value.clone());
            }
        }
        mapped
    }

    pub fn classify(&self, supplier: Supplier, part: SupplierPart) -> PartInfo {
        let (category, subcategory) = match self.find_category(&part.category_tree) {
            Some((category, subcategory)) => (Some(category), Some(subcategory)),
            None => {
                log::warn!(
                    "No category mapping for {} ({})",
                    part.manufacturer_part_number,
                    part.category_tree.join(" / ")
                );
                (None, None)
            }
        };
        let parameters = self.map_parameters(&part.parameters);

        PartInfo {
            supplier,
            part,
            category,
            subcategory,
            parameters,
        }
    }
}
