//! The boundary to the remote conference catalog.
//!
//! A [`Catalog`] knows two things: an opaque version token that changes
//! whenever the catalog's content changes, and the raw talk listing for a
//! single [`Period`]. Transport and wire format belong to the
//! implementation.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use speakercast_core::catalog::Catalog;
//! use speakercast_core::error::FetchError;
//! use speakercast_core::models::RawTalkRecord;
//! use speakercast_core::period::Period;
//!
//! struct EmptyCatalog;
//!
//! #[async_trait]
//! impl Catalog for EmptyCatalog {
//!     fn name(&self) -> &str { "empty" }
//!
//!     async fn current_version(&self) -> Result<String, FetchError> {
//!         Ok("0".to_string())
//!     }
//!
//!     async fn fetch(&self, period: Period) -> Result<Vec<RawTalkRecord>, FetchError> {
//!         Err(FetchError::Missing(period))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::RawTalkRecord;
use crate::period::Period;

/// A source of raw conference listings.
///
/// Implementations must be `Send + Sync`: the ingestion pipeline calls
/// [`fetch`](Catalog::fetch) for many periods at once from worker tasks.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Short label used in logs (e.g. `"http"`, `"directory"`).
    fn name(&self) -> &str;

    /// The catalog's current version token.
    async fn current_version(&self) -> Result<String, FetchError>;

    /// All raw talk records published for `period`.
    ///
    /// One round trip per call. A failure only concerns this period.
    async fn fetch(&self, period: Period) -> Result<Vec<RawTalkRecord>, FetchError>;
}
