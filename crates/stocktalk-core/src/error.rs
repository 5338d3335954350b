// crates/stocktalk-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("required parameter '{0}' is missing")]
    Configuration(&'static str),

    #[error("unsupported value '{value}' for parameter '{parameter}'")]
    UnsupportedValue {
        parameter: &'static str,
        value: String,
    },

    #[error("record could not be shaped into the staging schema: {0}")]
    DataShape(String),

    #[error("search request failed: {0}")]
    Search(String),

    #[error("staging table '{0}' already exists and if_exists is 'fail'")]
    TableExists(&'static str),

    #[error("database operation failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
