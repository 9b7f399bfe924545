//! InvenTree REST client: connectivity, category lookup, part creation and deletion.

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::InvenTreeConfig;
use crate::error::{ApiError, Result, check_status};
use crate::form::PartForm;
use crate::supplier::http_client;

const SERVICE: &str = "InvenTree";

/// InvenTree category primary keys for a form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Categories {
    pub category: Option<u64>,
    pub subcategory: Option<u64>,
}

impl Categories {
    pub fn is_resolved(&self) -> bool {
        self.category.is_some() && self.subcategory.is_some()
    }
}

/// Outcome of a create-or-match call
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPart {
    /// `false` when the form matched an existing part
    pub new_part: bool,
    pub pk: u64,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed(String),
}

/// The part-management server the harness imports into
pub trait PartServer {
    fn connect(&mut self) -> Result<()>;

    fn get_categories(&self, form: &PartForm) -> Result<Categories>;

    fn create_part(&self, form: &PartForm, categories: &Categories) -> Result<CreatedPart>;

    fn delete_part(&self, pk: u64) -> DeleteOutcome;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedEntry {
    pk: u64,
    name: String,
    #[serde(default)]
    parent: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ManufacturerPartEntry {
    part: u64,
    #[serde(rename = "MPN")]
    mpn: String,
}

#[derive(Debug, Deserialize)]
struct Created {
    pk: u64,
}

pub struct InvenTreeClient {
    config: InvenTreeConfig,
    client: Client,
    token: Option<String>,
}

impl InvenTreeClient {
    pub fn new(config: InvenTreeConfig, timeout_secs: u64) -> Result<Self> {
        let token = config.token.clone().filter(|t| !t.is_empty());
        Ok(Self {
            config,
            client: http_client(timeout_secs)?,
            token,
        })
    }

    fn server(&self) -> Result<&str> {
        self.config
            .server
            .as_deref()
            .map(|s| s.trim_end_matches('/'))
            .ok_or(ApiError::MissingConfig("inventree.server"))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ApiError::NotConnected)?;
        let url = format!("{}{}", self.server()?, path);
        log::debug!("{method} {url}");
        Ok(self
            .client
            .request(method, url)
            .header("Authorization", format!("Token {token}"))
            .header("Accept", "application/json"))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.request(Method::GET, path)?.query(query).send()?;
        check_status(SERVICE, response)?
            .json()
            .map_err(|e| ApiError::decode(SERVICE, e))
    }

    fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let value: serde_json::Value = self.get(path, query)?;
        list_items(value)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self.request(Method::POST, path)?.json(body).send()?;
        check_status(SERVICE, response)?
            .json()
            .map_err(|e| ApiError::decode(SERVICE, e))
    }

    fn find_category(&self, name: &str, parent: Option<u64>) -> Result<Option<u64>> {
        let entries: Vec<NamedEntry> = self.get_list("/api/part/category/", &[("search", name)])?;
        Ok(pick_named(&entries, name, Some(parent)))
    }

    /// Existing part carrying this manufacturer part number, if any
    fn find_existing_part(&self, mpn: &str) -> Result<Option<u64>> {
        let entries: Vec<ManufacturerPartEntry> =
            self.get_list("/api/company/part/manufacturer/", &[("MPN", mpn)])?;
        Ok(entries
            .iter()
            .find(|e| e.mpn.eq_ignore_ascii_case(mpn))
            .map(|e| e.part))
    }

    fn find_or_create_company(&self, name: &str, role: CompanyRole) -> Result<u64> {
        let flag = role.filter();
        let entries: Vec<NamedEntry> =
            self.get_list("/api/company/", &[("search", name), (flag, "true")])?;
        if let Some(pk) = pick_named(&entries, name, None) {
            return Ok(pk);
        }

        log::debug!("Creating company {name}");
        let created: Created = self.post(
            "/api/company/",
            &json!({
                "name": name,
                "is_manufacturer": role == CompanyRole::Manufacturer,
                "is_supplier": role == CompanyRole::Supplier,
            }),
        )?;
        Ok(created.pk)
    }

    fn add_parameters(&self, part_pk: u64, form: &PartForm) -> Result<()> {
        for (name, value) in &form.parameters {
            let templates: Vec<NamedEntry> =
                self.get_list("/api/part/parameter/template/", &[("search", name)])?;
            let Some(template) = pick_named(&templates, name, None) else {
                log::warn!("No parameter template named '{name}', skipping");
                continue;
            };
            let _: serde_json::Value = self.post(
                "/api/part/parameter/",
                &json!({ "part": part_pk, "template": template, "data": value }),
            )?;
        }
        Ok(())
    }

    /// Create the part, then attach its manufacturer, supplier, pricing and parameters.
    ///
    /// If attaching fails the new part is deleted again before the error is returned.
    fn create_new_part(&self, form: &PartForm, subcategory: u64) -> Result<CreatedPart> {
        let data: serde_json::Value = self.post("/api/part/", &part_payload(form, subcategory))?;
        let pk = data
            .get("pk")
            .and_then(|pk| pk.as_u64())
            .ok_or_else(|| ApiError::decode(SERVICE, "created part has no pk"))?;

        if let Err(e) = self.attach_details(pk, form) {
            match self.delete_part(pk) {
                DeleteOutcome::Deleted => log::warn!("Removed part {pk} after failed import: {e}"),
                DeleteOutcome::Failed(reason) => {
                    log::error!("Part {pk} was only partially imported: {reason}")
                }
            }
            return Err(e);
        }

        Ok(CreatedPart {
            new_part: true,
            pk,
            data,
        })
    }

    fn attach_details(&self, pk: u64, form: &PartForm) -> Result<()> {
        let manufacturer =
            self.find_or_create_company(&form.manufacturer_name, CompanyRole::Manufacturer)?;
        let manufacturer_part: Created = self.post(
            "/api/company/part/manufacturer/",
            &json!({
                "part": pk,
                "manufacturer": manufacturer,
                "MPN": form.manufacturer_part_number,
                "link": form.datasheet,
            }),
        )?;

        let supplier = self.find_or_create_company(&form.supplier_name, CompanyRole::Supplier)?;
        let supplier_part: Created = self.post(
            "/api/company/part/",
            &json!({
                "part": pk,
                "supplier": supplier,
                "SKU": form.supplier_part_number,
                "manufacturer_part": manufacturer_part.pk,
                "link": form.supplier_link,
            }),
        )?;

        for price_break in &form.pricing {
            let _: serde_json::Value = self.post(
                "/api/company/price-break/",
                &json!({
                    "part": supplier_part.pk,
                    "quantity": price_break.qty,
                    "price": price_break.price,
                }),
            )?;
        }

        self.add_parameters(pk, form)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompanyRole {
    Manufacturer,
    Supplier,
}

impl CompanyRole {
    fn filter(self) -> &'static str {
        match self {
            CompanyRole::Manufacturer => "is_manufacturer",
            CompanyRole::Supplier => "is_supplier",
        }
    }
}

impl PartServer for InvenTreeClient {
    fn connect(&mut self) -> Result<()> {
        let server = self.server()?.to_string();

        if self.token.is_none() {
            let username = self
                .config
                .username
                .as_deref()
                .ok_or(ApiError::MissingConfig("inventree.username"))?;
            let url = format!("{server}/api/user/token/");
            log::debug!("GET {url}");
            let response = self
                .client
                .get(&url)
                .basic_auth(username, self.config.password.as_deref())
                .send()?;
            let token: TokenResponse = check_status(SERVICE, response)?
                .json()
                .map_err(|e| ApiError::decode(SERVICE, e))?;
            self.token = Some(token.token);
        }

        let info: serde_json::Value = self.get("/api/", &[])?;
        log::debug!(
            "Connected to InvenTree {} (API {})",
            info.get("version").and_then(|v| v.as_str()).unwrap_or("?"),
            info.get("apiVersion").map(|v| v.to_string()).unwrap_or_default()
        );
        Ok(())
    }

    fn get_categories(&self, form: &PartForm) -> Result<Categories> {
        let mut categories = Categories::default();
        let Some(category_name) = form.category.as_deref() else {
            return Ok(categories);
        };

        categories.category = self.find_category(category_name, None)?;
        if let (Some(parent), Some(subcategory_name)) =
            (categories.category, form.subcategory.as_deref())
        {
            categories.subcategory = self.find_category(subcategory_name, Some(parent))?;
        }
        Ok(categories)
    }

    fn create_part(&self, form: &PartForm, categories: &Categories) -> Result<CreatedPart> {
        if let Some(pk) = self.find_existing_part(&form.manufacturer_part_number)? {
            log::debug!(
                "{} matches existing part {pk}",
                form.manufacturer_part_number
            );
            let data: serde_json::Value = self.get(&format!("/api/part/{pk}/"), &[])?;
            return Ok(CreatedPart {
                new_part: false,
                pk,
                data,
            });
        }

        let subcategory = categories
            .subcategory
            .ok_or(ApiError::MissingConfig("part subcategory"))?;
        self.create_new_part(form, subcategory)
    }

    fn delete_part(&self, pk: u64) -> DeleteOutcome {
        let path = format!("/api/part/{pk}/");

        // Active parts cannot be deleted
        let deactivate = self
            .request(Method::PATCH, &path)
            .and_then(|r| Ok(r.json(&json!({ "active": false })).send()?))
            .and_then(|r| check_status(SERVICE, r));
        if let Err(e) = deactivate {
            return DeleteOutcome::Failed(format!("deactivate part {pk}: {e}"));
        }

        match self
            .request(Method::DELETE, &path)
            .and_then(|r| Ok(r.send()?))
            .and_then(|r| check_status(SERVICE, r))
        {
            Ok(_) => DeleteOutcome::Deleted,
            Err(e) => DeleteOutcome::Failed(format!("delete part {pk}: {e}")),
        }
    }
}

/// List endpoints answer with a bare array, or `{"results": [...]}` when paginated.
fn list_items<T: DeserializeOwned>(value: serde_json::Value) -> Result<Vec<T>> {
    let items = match value {
        serde_json::Value::Object(mut map) => map
            .remove("results")
            .ok_or_else(|| ApiError::decode(SERVICE, "list response has no results"))?,
        other => other,
    };
    serde_json::from_value(items).map_err(|e| ApiError::decode(SERVICE, e))
}

/// Exact (case-insensitive) name match; `parent` of `Some(p)` also requires that parent.
fn pick_named(entries: &[NamedEntry], name: &str, parent: Option<Option<u64>>) -> Option<u64> {
    entries
        .iter()
        .filter(|e| e.name.eq_ignore_ascii_case(name))
        .find(|e| parent.is_none_or(|p| e.parent == p))
        .map(|e| e.pk)
}

fn part_payload(form: &PartForm, subcategory: u64) -> serde_json::Value {
    json!({
        "name": form.name,
        "description": form.description,
        "revision": form.revision,
        "keywords": form.keywords,
        "category": subcategory,
        "link": form.supplier_link,
        "component": true,
        "purchaseable": true,
        "active": true,
    })
}
