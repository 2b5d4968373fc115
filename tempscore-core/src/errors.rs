use thiserror::Error;

use crate::scope::Scope;
use crate::timeseries::Year;

/// Error type for invalid engine operations.
///
/// Batch-level structural problems ([`EngineError::DataCompleteness`]) are
/// fatal for the run; everything else describes a single company, target, or
/// configuration and is either surfaced directly or isolated by the caller.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No derivable emission intensity for any scope of the listed companies.
    /// Offending company/scope pairs are reported together, not one at a time.
    #[error("provide either historic emission intensity data, or historic emission and production data for these company - scope combinations: {0:?}")]
    DataCompleteness(Vec<String>),

    /// A company id was requested that is not present in the fundamental data.
    #[error("company IDs not found in fundamental data: {0:?}")]
    UnknownCompanies(Vec<String>),

    /// Arithmetic between quantities of incompatible unit.
    #[error("wrong input units: expected {expected}, got {actual}")]
    UnitMismatch { expected: String, actual: String },

    /// A unit expression could not be parsed.
    #[error("could not parse unit expression {0:?}")]
    UnitParse(String),

    /// Data required to anchor a projection is missing for one company.
    #[error("missing base data for company {company_id}: {detail}")]
    MissingBaseData { company_id: String, detail: String },

    /// An absolute and an intensity target cannot be merge-ordered.
    #[error("cannot order absolute and intensity targets ending {year} for company {company_id}, scope {scope}")]
    UnsupportedTargetCombination {
        company_id: String,
        scope: Scope,
        year: Year,
    },

    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document failed to parse.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience type for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;
