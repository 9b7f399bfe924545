pub mod config;
pub mod error;
pub mod form;
pub mod inventree;
pub mod mapping;
pub mod part;
pub mod supplier;

#[cfg(test)]
mod test_server;

pub use config::{ApiConfig, CategoryMap, CategoryRule, default_config_path};
pub use error::{ApiError, Result};
pub use form::{PartForm, translate_supplier_to_form};
pub use inventree::{Categories, CreatedPart, DeleteOutcome, InvenTreeClient, PartServer};
pub use mapping::Mapping;
pub use part::{PartInfo, PriceBreak, Supplier, SupplierPart};
pub use supplier::{
    DigiKeyClient, LcscClient, MouserClient, SupplierApi, build_clients, supplier_search,
};
