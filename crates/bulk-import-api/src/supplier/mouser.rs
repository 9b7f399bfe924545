use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{SupplierApi, http_client, non_empty, parse_price};
use crate::config::MouserConfig;
use crate::error::{ApiError, Result, check_status};
use crate::part::{PriceBreak, Supplier, SupplierPart};

const SERVICE: &str = "Mouser";

pub struct MouserClient {
    config: MouserConfig,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchByPartRequest<'a> {
    mouser_part_number: &'a str,
    part_search_options: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResponse {
    #[serde(default)]
    errors: Vec<SearchError>,
    search_results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchResults {
    #[serde(default)]
    parts: Vec<MouserPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct MouserPart {
    description: String,
    manufacturer: String,
    manufacturer_part_number: String,
    mouser_part_number: String,
    product_detail_url: Option<String>,
    data_sheet_url: Option<String>,
    image_path: Option<String>,
    category: String,
    price_breaks: Vec<MouserPriceBreak>,
    product_attributes: Vec<ProductAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MouserPriceBreak {
    quantity: u32,
    price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductAttribute {
    attribute_name: String,
    attribute_value: String,
}

impl MouserClient {
    pub fn new(config: MouserConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            config,
            client: http_client(timeout_secs)?,
        })
    }
}

impl SupplierApi for MouserClient {
    fn supplier(&self) -> Supplier {
        Supplier::Mouser
    }

    fn test_api(&self) -> Result<()> {
        self.search(&self.config.test_part_number).map(|_| ())
    }

    fn search(&self, part_number: &str) -> Result<SupplierPart> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ApiError::MissingConfig("mouser.api_key"))?;
        let url = format!("{}/api/v1/search/partnumber", self.config.api_url);
        log::debug!("POST {url} ({part_number})");

        let response = self
            .client
            .post(&url)
            .query(&[("apiKey", api_key)])
            .json(&serde_json::json!({
                "SearchByPartRequest": SearchByPartRequest {
                    mouser_part_number: part_number,
                    part_search_options: "Exact",
                }
            }))
            .send()?;
        let body: serde_json::Value = check_status(SERVICE, response)?
            .json()
            .map_err(|e| ApiError::decode(SERVICE, e))?;

        decode_search(part_number, body)
    }
}

fn decode_search(part_number: &str, body: serde_json::Value) -> Result<SupplierPart> {
    let response: SearchResponse =
        serde_json::from_value(body).map_err(|e| ApiError::decode(SERVICE, e))?;

    if let Some(error) = response.errors.first() {
        return Err(ApiError::decode(SERVICE, &error.message));
    }

    let parts = response.search_results.map(|r| r.parts).unwrap_or_default();
    // Exact search can still return several packagings; keep the requested one if present
    let index = parts
        .iter()
        .position(|p| {
            p.mouser_part_number.eq_ignore_ascii_case(part_number)
                || p.manufacturer_part_number.eq_ignore_ascii_case(part_number)
        })
        .unwrap_or(0);
    let part = parts
        .into_iter()
        .nth(index)
        .ok_or_else(|| ApiError::NotFound {
            service: SERVICE,
            part_number: part_number.to_string(),
        })?;

    Ok(SupplierPart {
        supplier_part_number: part.mouser_part_number,
        manufacturer_name: part.manufacturer,
        manufacturer_part_number: part.manufacturer_part_number,
        description: part.description,
        keywords: None,
        product_url: non_empty(part.product_detail_url),
        datasheet: non_empty(part.data_sheet_url),
        image: non_empty(part.image_path),
        category_tree: vec![part.category].into_iter().filter(|c| !c.is_empty()).collect(),
        parameters: part
            .product_attributes
            .into_iter()
            .map(|a| (a.attribute_name, a.attribute_value))
            .collect(),
        pricing: part
            .price_breaks
            .iter()
            .filter_map(|pb| {
                parse_price(&pb.price).map(|price| PriceBreak {
                    qty: pb.quantity,
                    price,
                })
            })
            .collect(),
    })
}
