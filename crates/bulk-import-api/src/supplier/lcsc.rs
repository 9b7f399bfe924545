use reqwest::blocking::Client;
use serde::Deserialize;

use super::{SupplierApi, http_client, non_empty, parse_price};
use crate::config::LcscConfig;
use crate::error::{ApiError, Result, check_status};
use crate::part::{PriceBreak, Supplier, SupplierPart};

const SERVICE: &str = "LCSC";

/// LCSC public product-detail endpoint; needs no credentials
pub struct LcscClient {
    config: LcscConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    result: Option<LcscProduct>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LcscProduct {
    product_code: String,
    product_model: String,
    brand_name_en: String,
    product_intro_en: String,
    parent_catalog_name: Option<String>,
    catalog_name: Option<String>,
    pdf_url: Option<String>,
    product_images: Vec<String>,
    product_price_list: Vec<LcscPrice>,
    #[serde(rename = "paramVOList")]
    param_list: Option<Vec<LcscParam>>,
}

#[derive(Debug, Deserialize)]
struct LcscPrice {
    ladder: u32,
    #[serde(rename = "productPrice")]
    product_price: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LcscParam {
    param_name_en: String,
    param_value_en: String,
}

/// LCSC product codes are `C` followed by digits; accept bare digits too.
pub(crate) fn normalize_product_code(part_number: &str) -> String {
    let trimmed = part_number.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("C{trimmed}")
    } else {
        trimmed.to_ascii_uppercase()
    }
}

impl LcscClient {
    pub fn new(config: LcscConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            config,
            client: http_client(timeout_secs)?,
        })
    }
}

impl SupplierApi for LcscClient {
    fn supplier(&self) -> Supplier {
        Supplier::Lcsc
    }

    fn test_api(&self) -> Result<()> {
        self.search(&self.config.test_part_number).map(|_| ())
    }

    fn search(&self, part_number: &str) -> Result<SupplierPart> {
        let code = normalize_product_code(part_number);
        let url = format!("{}/ftps/wm/product/detail", self.config.api_url);
        log::debug!("GET {url}?productCode={code}");

        let response = self
            .client
            .get(&url)
            .query(&[("productCode", code.as_str())])
            .send()?;
        let body: serde_json::Value = check_status(SERVICE, response)?
            .json()
            .map_err(|e| ApiError::decode(SERVICE, e))?;

        decode_detail(&code, body)
    }
}

fn decode_detail(code: &str, body: serde_json::Value) -> Result<SupplierPart> {
    let response: DetailResponse =
        serde_json::from_value(body).map_err(|e| ApiError::decode(SERVICE, e))?;
    if response.code != 200 {
        return Err(ApiError::decode(
            SERVICE,
            response.msg.unwrap_or_else(|| format!("code {}", response.code)),
        ));
    }
    let product = response.result.ok_or_else(|| ApiError::NotFound {
        service: SERVICE,
        part_number: code.to_string(),
    })?;

    let category_tree = [product.parent_catalog_name, product.catalog_name]
        .into_iter()
        .flatten()
        .filter(|c| !c.is_empty())
        .collect();

    // Prices come back as either numbers or strings depending on the endpoint revision
    let pricing = product
        .product_price_list
        .iter()
        .filter_map(|p| {
            let price = match &p.product_price {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => parse_price(s),
                _ => None,
            }?;
            Some(PriceBreak {
                qty: p.ladder,
                price,
            })
        })
        .collect();

    Ok(SupplierPart {
        supplier_part_number: product.product_code,
        manufacturer_name: product.brand_name_en,
        manufacturer_part_number: product.product_model,
        description: product.product_intro_en,
        keywords: None,
        product_url: Some(format!("https://www.lcsc.com/product-detail/{code}.html")),
        datasheet: non_empty(product.pdf_url),
        image: product.product_images.into_iter().next(),
        category_tree,
        parameters: product
            .param_list
            .unwrap_or_default()
            .into_iter()
            .map(|p| (p.param_name_en, p.param_value_en))
            .collect(),
        pricing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_product_code() {
        assert_eq!(normalize_product_code("1525"), "C1525");
        assert_eq!(normalize_product_code("c1525"), "C1525");
        assert_eq!(normalize_product_code(" C1525 "), "C1525");
    }

    #[test]
    fn test_decode_detail() {
        let body = json!({
            "code": 200,
            "msg": null,
            "result": {
                "productCode": "C1525",
                "productModel": "CL05B104KO5NNNC",
                "brandNameEn": "Samsung Electro-Mechanics",
                "productIntroEn": "16V 100nF X7R ±10% 0402 MLCC",
                "parentCatalogName": "Capacitors",
                "catalogName": "Multilayer Ceramic Capacitors MLCC - SMD/SMT",
                "pdfUrl": "https://datasheet.lcsc.com/C1525.pdf",
                "productImages": ["https://assets.lcsc.com/C1525_front.jpg"],
                "productPriceList": [
                    { "ladder": 100, "productPrice": 0.0011 },
                    { "ladder": 1000, "productPrice": "0.0008" }
                ],
                "paramVOList": [
                    { "paramNameEn": "Capacitance", "paramValueEn": "100nF" }
                ]
            }
        });

        let part = decode_detail("C1525", body).unwrap();
        assert_eq!(part.manufacturer_part_number, "CL05B104KO5NNNC");
        assert_eq!(part.category_tree.len(), 2);
        assert_eq!(part.pricing.len(), 2);
        assert_eq!(part.pricing[1].price, 0.0008);
        assert_eq!(part.parameters["Capacitance"], "100nF");
        assert_eq!(
            part.product_url.as_deref(),
            Some("https://www.lcsc.com/product-detail/C1525.html")
        );
    }

    #[test]
    fn test_decode_detail_error_code() {
        let body = json!({ "code": 404, "msg": "product not found", "result": null });
        let err = decode_detail("C0", body).unwrap_err();
        assert!(err.to_string().contains("product not found"));
    }
}
