mod digikey;
mod lcsc;
mod mouser;

pub use digikey::DigiKeyClient;
pub use lcsc::LcscClient;
pub use mouser::MouserClient;

use reqwest::blocking::Client;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::mapping::Mapping;
use crate::part::{PartInfo, Supplier, SupplierPart};

/// A distributor's part lookup API
pub trait SupplierApi {
    fn supplier(&self) -> Supplier;

    /// Authenticated round trip against a known part; `Err` explains why the API is unusable.
    fn test_api(&self) -> Result<()>;

    fn search(&self, part_number: &str) -> Result<SupplierPart>;
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Build a client for every supported supplier, in preflight order.
pub fn build_clients(config: &ApiConfig) -> Result<Vec<Box<dyn SupplierApi>>> {
    let timeout = config.timeout_secs();
    Ok(vec![
        Box::new(DigiKeyClient::new(config.digikey.clone(), timeout)?),
        Box::new(MouserClient::new(config.mouser.clone(), timeout)?),
        Box::new(LcscClient::new(config.lcsc.clone(), timeout)?),
    ])
}

/// Look up `part_number` and classify the result for InvenTree.
pub fn supplier_search(
    api: &dyn SupplierApi,
    mapping: &Mapping,
    part_number: &str,
) -> Result<PartInfo> {
    log::debug!("Searching {} for {}", api.supplier(), part_number);
    let part = api.search(part_number)?;
    Ok(mapping.classify(api.supplier(), part))
}

/// Parse a price string such as `$1,234.50`, `0.0123` or `1.234,50 €`.
///
/// The last of `.` or `,` is the decimal separator when both appear. A lone comma
/// counts as decimal unless exactly three digits follow it (`1,234`), except after
/// a leading zero (`0,125`). Repeated dots without a comma are rejected.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();

    let decimal = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if comma > dot { ',' } else { '.' }),
        (Some(_), None) => Some('.'),
        (None, Some(comma)) => {
            let single = cleaned.matches(',').count() == 1;
            let fraction_digits = cleaned.len() - comma - 1;
            (single && (fraction_digits != 3 || cleaned.starts_with("0,"))).then_some(',')
        }
        (None, None) => None,
    };

    let normalized: String = cleaned
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            c if Some(c) == decimal => Some('.'),
            _ => None,
        })
        .collect();
    normalized.parse().ok()
}

/// Empty strings from supplier payloads become `None`.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$0.10"), Some(0.10));
        assert_eq!(parse_price("$1,234.50"), Some(1234.50));
        assert_eq!(parse_price("0.0123"), Some(0.0123));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("N/A"), None);
    }

    #[test]
    fn test_parse_price_decimal_comma() {
        assert_eq!(parse_price("0,10 €"), Some(0.10));
        assert_eq!(parse_price("1.234,50 €"), Some(1234.50));
        assert_eq!(parse_price("0,125 €"), Some(0.125));
        // Thousands separators only
        assert_eq!(parse_price("$1,234"), Some(1234.0));
        assert_eq!(parse_price("1,234,567"), Some(1234567.0));
        assert_eq!(parse_price("1.234.567"), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("x".into())), Some("x".into()));
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(None), None);
    }
}
