pub mod models;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod document_extractor;

pub use document_extractor::{extract_identity, extract_property, DocumentExtractor};
pub use models::{
    DocumentType, ExtractionRules, FieldProvenance, IdentityExtraction, IdentityFields, PropertyExtraction,
    PropertyFields, Strategy,
};
pub use utils::{ExtractionError, Result};
