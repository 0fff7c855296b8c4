//! Error types for the advisor library

use thiserror::Error;

/// A node role code carried none of the data tier markers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tier undefined for node role {role:?}")]
pub struct UnknownTierError {
    pub role: String,
}

/// Errors produced while turning raw cluster data into recommendations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    UnknownTier(#[from] UnknownTierError),

    /// A disk figure from the allocation API is not a byte count.
    #[error("malformed {field} value {value:?}: {source}")]
    MalformedNumeric {
        field: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("malformed size {value:?}, expected e.g. 10g or 512mb")]
    MalformedSize { value: String },

    #[error("malformed duration {value:?}")]
    MalformedDuration { value: String },

    #[error("column {value:?} is not allowed for sorting, use one of [age size]")]
    InvalidSortColumn { value: String },

    #[error("target phase {value:?} is invalid, valid values are: [hot warm cold frozen delete]")]
    InvalidPhase { value: String },

    #[error("policy {policy:?} not found")]
    PolicyNotFound { policy: String },

    #[error("invalid region {value:?}, expected format \"<provider>-<region>\", e.g. \"azure-westeurope\"")]
    MalformedRegion { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;
