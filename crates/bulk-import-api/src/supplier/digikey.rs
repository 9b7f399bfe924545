use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::cell::RefCell;
use std::time::{Duration, Instant};

use super::{SupplierApi, http_client, non_empty};
use crate::config::DigiKeyConfig;
use crate::error::{ApiError, Result, check_status};
use crate::part::{PriceBreak, Supplier, SupplierPart};

const SERVICE: &str = "Digi-Key";

/// Lifetime Digi-Key gives client-credentials tokens when `expires_in` is absent
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 599;
/// Tokens this close to expiry are replaced before use
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Digi-Key Product Information v4 client (OAuth2 client credentials)
pub struct DigiKeyClient {
    config: DigiKeyConfig,
    client: Client,
    token: RefCell<Option<AccessToken>>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn new(value: String, expires_in_secs: u64, issued_at: Instant) -> Self {
        Self {
            value,
            expires_at: issued_at + Duration::from_secs(expires_in_secs),
        }
    }

    fn is_valid_at(&self, now: Instant) -> bool {
        now + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProductDetailsResponse {
    product: Option<Product>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Product {
    description: Description,
    manufacturer: Manufacturer,
    manufacturer_product_number: String,
    product_url: Option<String>,
    datasheet_url: Option<String>,
    photo_url: Option<String>,
    category: Option<Category>,
    parameters: Vec<Parameter>,
    product_variations: Vec<ProductVariation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Description {
    product_description: String,
    detailed_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Manufacturer {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Category {
    name: String,
    #[serde(default)]
    child_categories: Vec<Category>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Parameter {
    parameter_text: String,
    value_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ProductVariation {
    digi_key_product_number: String,
    standard_pricing: Vec<StandardPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StandardPrice {
    break_quantity: u32,
    unit_price: f64,
}

impl DigiKeyClient {
    pub fn new(config: DigiKeyConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            config,
            client: http_client(timeout_secs)?,
            token: RefCell::new(None),
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let id = self
            .config
            .client_id
            .as_deref()
            .ok_or(ApiError::MissingConfig("digikey.client_id"))?;
        let secret = self
            .config
            .client_secret
            .as_deref()
            .ok_or(ApiError::MissingConfig("digikey.client_secret"))?;
        Ok((id, secret))
    }

    fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.borrow().as_ref() {
            if token.is_valid_at(Instant::now()) {
                return Ok(token.value.clone());
            }
            log::debug!("Digi-Key token expired, requesting a new one");
        }

        let (client_id, client_secret) = self.credentials()?;
        let url = format!("{}/v1/oauth2/token", self.config.api_url);
        log::debug!("Requesting Digi-Key token from {url}");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ])
            .send()?;
        let token: TokenResponse = check_status(SERVICE, response)?
            .json()
            .map_err(|e| ApiError::decode(SERVICE, e))?;

        *self.token.borrow_mut() = Some(AccessToken::new(
            token.access_token.clone(),
            token.expires_in,
            Instant::now(),
        ));
        Ok(token.access_token)
    }

    /// Fetch product details, getting a fresh token once if Digi-Key rejects the cached one.
    fn product_details(&self, part_number: &str) -> Result<serde_json::Value> {
        match self.fetch_product_details(part_number) {
            Err(ApiError::Status { status, .. }) if status == StatusCode::UNAUTHORIZED => {
                log::debug!("Digi-Key rejected the cached token, retrying with a new one");
                self.token.borrow_mut().take();
                self.fetch_product_details(part_number)
            }
            result => result,
        }
    }

    fn fetch_product_details(&self, part_number: &str) -> Result<serde_json::Value> {
        let token = self.access_token()?;
        let (client_id, _) = self.credentials()?;
        let url = format!(
            "{}/products/v4/search/{}/productdetails",
            self.config.api_url,
            urlencoding::encode(part_number)
        );
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("X-DIGIKEY-Client-Id", client_id)
            .header("X-DIGIKEY-Locale-Site", &self.config.locale_site)
            .header("X-DIGIKEY-Locale-Language", &self.config.locale_language)
            .header("X-DIGIKEY-Locale-Currency", &self.config.locale_currency)
            .send()?;

        check_status(SERVICE, response)?
            .json()
            .map_err(|e| ApiError::decode(SERVICE, e))
    }
}

impl SupplierApi for DigiKeyClient {
    fn supplier(&self) -> Supplier {
        Supplier::DigiKey
    }

    fn test_api(&self) -> Result<()> {
        let part = self.search(&self.config.test_part_number)?;
        if part.manufacturer_part_number.is_empty() {
            return Err(ApiError::decode(SERVICE, "test part returned no content"));
        }
        Ok(())
    }

    fn search(&self, part_number: &str) -> Result<SupplierPart> {
        let body = self.product_details(part_number)?;
        decode_product_details(part_number, body)
    }
}

fn decode_product_details(part_number: &str, body: serde_json::Value) -> Result<SupplierPart> {
    let response: ProductDetailsResponse =
        serde_json::from_value(body).map_err(|e| ApiError::decode(SERVICE, e))?;
    let product = response.product.ok_or_else(|| ApiError::NotFound {
        service: SERVICE,
        part_number: part_number.to_string(),
    })?;

    // Digi-Key nests the leaf category under its parents, one child per level
    let mut category_tree = Vec::new();
    let mut level = product.category.as_ref();
    while let Some(category) = level {
        category_tree.push(category.name.clone());
        level = category.child_categories.first();
    }

    // Prefer the variation matching the requested number, fall back to the first
    let variation = product
        .product_variations
        .iter()
        .find(|v| v.digi_key_product_number.eq_ignore_ascii_case(part_number))
        .or_else(|| product.product_variations.first());

    let supplier_part_number = variation
        .map(|v| v.digi_key_product_number.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| part_number.to_string());

    let pricing = variation
        .map(|v| {
            v.standard_pricing
                .iter()
                .map(|p| PriceBreak {
                    qty: p.break_quantity,
                    price: p.unit_price,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(SupplierPart {
        supplier_part_number,
        manufacturer_name: product.manufacturer.name,
        manufacturer_part_number: product.manufacturer_product_number,
        description: product.description.product_description,
        keywords: non_empty(product.description.detailed_description),
        product_url: non_empty(product.product_url),
        datasheet: non_empty(product.datasheet_url),
        image: non_empty(product.photo_url),
        category_tree,
        parameters: product
            .parameters
            .into_iter()
            .map(|p| (p.parameter_text, p.value_text))
            .collect(),
        pricing,
    })
}
