use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Parts distributors with a lookup API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Supplier {
    #[serde(rename = "Digi-Key")]
    DigiKey,
    Mouser,
    #[serde(rename = "LCSC")]
    Lcsc,
}

impl Supplier {
    pub const ALL: [Supplier; 3] = [Supplier::DigiKey, Supplier::Mouser, Supplier::Lcsc];

    pub fn name(&self) -> &'static str {
        match self {
            Supplier::DigiKey => "Digi-Key",
            Supplier::Mouser => "Mouser",
            Supplier::Lcsc => "LCSC",
        }
    }
}

impl fmt::Display for Supplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Supplier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "digikey" => Ok(Supplier::DigiKey),
            "mouser" => Ok(Supplier::Mouser),
            "lcsc" => Ok(Supplier::Lcsc),
            _ => Err(format!("unknown supplier '{s}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PriceBreak {
    pub qty: u32,
    pub price: f64,
}

/// Supplier response normalized across distributors
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SupplierPart {
    pub supplier_part_number: String,
    pub manufacturer_name: String,
    pub manufacturer_part_number: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Supplier categories, outermost first
    pub category_tree: Vec<String>,
    pub parameters: BTreeMap<String, String>,
    pub pricing: Vec<PriceBreak>,
}

/// Supplier data with InvenTree classification applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartInfo {
    pub supplier: Supplier,
    pub part: SupplierPart,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// InvenTree parameter template name -> value
    pub parameters: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supplier_from_str() {
        assert_eq!("Digi-Key".parse::<Supplier>(), Ok(Supplier::DigiKey));
        assert_eq!("digikey".parse::<Supplier>(), Ok(Supplier::DigiKey));
        assert_eq!("MOUSER".parse::<Supplier>(), Ok(Supplier::Mouser));
        assert_eq!("lcsc".parse::<Supplier>(), Ok(Supplier::Lcsc));
        assert!("arrow".parse::<Supplier>().is_err());
    }

    #[test]
    fn test_supplier_display_round_trips() {
        for supplier in Supplier::ALL {
            assert_eq!(supplier.to_string().parse::<Supplier>(), Ok(supplier));
        }
    }
}
