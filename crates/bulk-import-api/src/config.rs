//! API credentials, endpoints and supplier-to-InvenTree mappings.
//!
//! Loaded from a single YAML file. Secrets can be supplied through the
//! environment instead, which takes precedence over the file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub digikey: DigiKeyConfig,
    pub mouser: MouserConfig,
    pub lcsc: LcscConfig,
    pub inventree: InvenTreeConfig,
    /// InvenTree category -> subcategory -> supplier category keywords
    pub categories: CategoryMap,
    /// InvenTree parameter template -> supplier parameter names
    pub parameters: BTreeMap<String, Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigiKeyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_url: String,
    pub locale_site: String,
    pub locale_language: String,
    pub locale_currency: String,
    /// Part number used by the connectivity check
    pub test_part_number: String,
}

impl Default for DigiKeyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_url: "https://api.digikey.com".to_string(),
            locale_site: "US".to_string(),
            locale_language: "en".to_string(),
            locale_currency: "USD".to_string(),
            test_part_number: "296-6501-6-ND".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MouserConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub test_part_number: String,
}

impl Default for MouserConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.mouser.com".to_string(),
            test_part_number: "595-NE555P".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LcscConfig {
    pub api_url: String,
    pub test_part_number: String,
}

impl Default for LcscConfig {
    fn default() -> Self {
        Self {
            api_url: "https://wmsc.lcsc.com".to_string(),
            test_part_number: "C1525".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvenTreeConfig {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

/// Category mapping rules in the order they appear in the config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "serde_yaml::Mapping")]
pub struct CategoryMap(Vec<CategoryRule>);

/// One InvenTree subcategory and the supplier category names that select it
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub category: String,
    pub subcategory: String,
    pub keywords: Vec<String>,
}

impl CategoryMap {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<serde_yaml::Mapping> for CategoryMap {
    type Error = String;

    fn try_from(categories: serde_yaml::Mapping) -> std::result::Result<Self, String> {
        let mut rules = Vec::new();
        for (category, subcategories) in categories {
            let category = mapping_key(category)?;
            let subcategories: Option<serde_yaml::Mapping> = serde_yaml::from_value(subcategories)
                .map_err(|e| format!("category '{category}': {e}"))?;

            for (subcategory, keywords) in subcategories.unwrap_or_default() {
                let subcategory = mapping_key(subcategory)?;
                let keywords: Option<Vec<String>> = serde_yaml::from_value(keywords)
                    .map_err(|e| format!("subcategory '{category}/{subcategory}': {e}"))?;
                rules.push(CategoryRule {
                    category: category.clone(),
                    subcategory,
                    keywords: keywords.unwrap_or_default(),
                });
            }
        }
        Ok(Self(rules))
    }
}

fn mapping_key(key: serde_yaml::Value) -> std::result::Result<String, String> {
    match key {
        serde_yaml::Value::String(name) => Ok(name),
        other => Err(format!("category names must be strings, found {other:?}")),
    }
}

/// Default config location: `<config_dir>/bulk-import/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bulk-import").join("config.yaml"))
}

impl ApiConfig {
    /// Load the config file and apply environment overrides.
    ///
    /// A missing file is not an error: every field has a default and the
    /// credentials may come entirely from the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)?;
            Self::from_yaml(&content)?
        } else {
            log::debug!("Config file {} not found, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay credentials from `lookup` (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |slot: &mut Option<String>, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = Some(value);
            }
        };
        set(&mut self.digikey.client_id, "DIGIKEY_CLIENT_ID");
        set(&mut self.digikey.client_secret, "DIGIKEY_CLIENT_SECRET");
        set(&mut self.mouser.api_key, "MOUSER_PART_API_KEY");
        set(&mut self.inventree.server, "INVENTREE_SERVER_ADDRESS");
        set(&mut self.inventree.username, "INVENTREE_USERNAME");
        set(&mut self.inventree.password, "INVENTREE_PASSWORD");
        set(&mut self.inventree.token, "INVENTREE_API_TOKEN");
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}
