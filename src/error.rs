use thiserror::Error;

/// Errors raised by the report store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("City {0} does not exist.")]
    CityNotFound(String),
}
