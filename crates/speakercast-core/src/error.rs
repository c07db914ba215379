//! Error types for the ingestion and registry components.
//!
//! Store backends report failures as `anyhow::Error`; the component
//! errors here wrap them so callers can tell a storage failure apart from
//! a catalog or id-space problem.

use thiserror::Error;

use crate::period::Period;

/// Retrieving or decoding catalog data failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection, timeout, non-success status).
    #[error("request to {target} failed: {message}")]
    Transport { target: String, message: String },

    /// The catalog answered but the payload could not be decoded.
    #[error("could not decode {target}: {message}")]
    Decode { target: String, message: String },

    /// The catalog has no listing for the period.
    #[error("no listing for {0}")]
    Missing(Period),
}

/// A rebuild was aborted. The previously committed store is untouched.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// The requested range contains no conference.
    #[error("range contains no periods")]
    NoPeriods,

    /// Every period failed to fetch.
    #[error("all {attempted} periods failed to fetch")]
    AllPeriodsFailed { attempted: usize },

    /// A period failed while the strict failure policy is active.
    #[error("period {period} failed: {source}")]
    PeriodFailed {
        period: Period,
        #[source]
        source: FetchError,
    },

    /// Replacing the speaker buckets failed.
    #[error("store write failed: {0}")]
    Store(#[source] anyhow::Error),
}

/// No id could be assigned to a speaker set.
#[derive(Error, Debug)]
pub enum IdGenerationError {
    #[error("speaker set is empty")]
    EmptySpeakerSet,

    /// Every generated candidate collided with an existing id.
    #[error("id space exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}
