use thiserror::Error;

/// Fatal at operation start; reported to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OntologyError {
    #[error("could not read ontology document: {0}")]
    Load(String),

    #[error("ontology document is structurally invalid: {0}")]
    Schema(String),
}
