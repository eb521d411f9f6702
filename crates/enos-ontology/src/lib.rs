//! Ontology store and schema adapter.

pub mod error;
pub mod schema_adapter;
pub mod store;
pub mod types;

pub use error::OntologyError;
pub use schema_adapter::{adapt, to_raw, validate, Issue};
pub use store::OntologyStore;
pub use types::{EquipmentInfo, OntologyDocument, ResourceOntology, StandardPoint};
