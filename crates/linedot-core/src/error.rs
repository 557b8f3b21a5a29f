//! Error type shared across the chart pipeline

use crate::Role;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("no column bound to the {0} role")]
    MissingColumn(Role),

    #[error("category at row {row} does not match the column type")]
    InvalidCategory { row: usize },

    #[error("invalid settings or data view payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("render failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, ChartError>;
