use serde::Serialize;
use std::collections::BTreeMap;

use crate::part::{PartInfo, PriceBreak, Supplier};

/// Part creation form consumed by the InvenTree client
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartForm {
    pub name: String,
    pub description: String,
    pub revision: String,
    pub keywords: String,
    pub supplier_name: String,
    pub supplier_part_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_link: Option<String>,
    pub manufacturer_name: String,
    pub manufacturer_part_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub pricing: Vec<PriceBreak>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub parameters: BTreeMap<String, String>,
}

impl PartForm {
    /// A form without a manufacturer part number cannot be created or matched.
    pub fn is_empty(&self) -> bool {
        self.manufacturer_part_number.trim().is_empty()
    }

    /// Copy the InvenTree classification from the supplier lookup onto the form.
    pub fn merge_classification(&mut self, info: &PartInfo) {
        self.category = info.category.clone();
        self.subcategory = info.subcategory.clone();
        self.parameters = info.parameters.clone();
    }
}

pub fn translate_supplier_to_form(supplier: Supplier, info: &PartInfo) -> PartForm {
    let part = &info.part;
    let keywords = part
        .keywords
        .clone()
        .unwrap_or_else(|| part.description.clone());

    PartForm {
        name: part.manufacturer_part_number.trim().to_string(),
        description: part.description.trim().to_string(),
        revision: "A".to_string(),
        keywords,
        supplier_name: supplier.name().to_string(),
        supplier_part_number: part.supplier_part_number.clone(),
        supplier_link: part.product_url.clone(),
        manufacturer_name: part.manufacturer_name.trim().to_string(),
        manufacturer_part_number: part.manufacturer_part_number.trim().to_string(),
        datasheet: part.datasheet.clone(),
        image: part.image.clone(),
        pricing: part.pricing.clone(),
        category: None,
        subcategory: None,
        parameters: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::SupplierPart;

    fn info() -> PartInfo {
        PartInfo {
            supplier: Supplier::DigiKey,
            part: SupplierPart {
                supplier_part_number: "296-6501-6-ND".into(),
                manufacturer_name: " Texas Instruments ".into(),
                manufacturer_part_number: "NE555P".into(),
                description: "IC OSC SINGLE TIMER 100KHZ 8-DIP".into(),
                product_url: Some("https://www.digikey.com/NE555P".into()),
                category_tree: vec!["Integrated Circuits (ICs)".into()],
                pricing: vec![PriceBreak { qty: 1, price: 0.5 }],
                ..Default::default()
            },
            category: Some("Integrated Circuits".into()),
            subcategory: Some("Timers".into()),
            parameters: [("Frequency".to_string(), "100kHz".to_string())]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_translate_supplier_to_form() {
        let form = translate_supplier_to_form(Supplier::DigiKey, &info());
        assert_eq!(form.name, "NE555P");
        assert_eq!(form.supplier_name, "Digi-Key");
        assert_eq!(form.manufacturer_name, "Texas Instruments");
        assert_eq!(form.keywords, "IC OSC SINGLE TIMER 100KHZ 8-DIP");
        assert_eq!(form.revision, "A");
        // Classification is merged separately
        assert_eq!(form.category, None);
        assert!(form.parameters.is_empty());
        assert!(!form.is_empty());
    }

    #[test]
    fn test_merge_classification() {
        let info = info();
        let mut form = translate_supplier_to_form(Supplier::DigiKey, &info);
        form.merge_classification(&info);
        assert_eq!(form.category.as_deref(), Some("Integrated Circuits"));
        assert_eq!(form.subcategory.as_deref(), Some("Timers"));
        assert_eq!(form.parameters["Frequency"], "100kHz");
    }

    #[test]
    fn test_empty_form() {
        assert!(PartForm::default().is_empty());
    }
}
