//! Ingestion pipeline orchestration.
//!
//! Coordinates a full rebuild: period enumeration → concurrent catalog
//! fetches → canonicalization and filtering → grouping by speaker →
//! atomic store replacement.
//!
//! # Concurrency
//!
//! One task per period is spawned into a [`JoinSet`] on the multi-thread
//! runtime. A [`Semaphore`] with `concurrency` permits bounds how many
//! fetches are in flight. Results are slotted by period index as they
//! complete, then aggregated in period order, so the buckets are the same
//! for the same set of successful periods whatever the arrival order.
//!
//! # Failures
//!
//! A failed period is logged and skipped. The rebuild is aborted, and the
//! store left untouched, when every period failed (or, under
//! [`FailurePolicy::AnyFailed`], when any did).

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use speakercast_core::canonical::{Canonicalizer, DropReason};
use speakercast_core::catalog::Catalog;
use speakercast_core::error::{FetchError, IngestionError};
use speakercast_core::models::{RawTalkRecord, SpeakerBuckets};
use speakercast_core::period::{self, Period};
use speakercast_core::store::Store;

use crate::config::{FailurePolicy, IngestConfig};

/// Knobs for a single rebuild.
#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            concurrency: 10,
            failure_policy: FailurePolicy::AllFailed,
        }
    }
}

impl From<&IngestConfig> for IngestOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            failure_policy: config.failure_policy,
        }
    }
}

/// Counts from a completed rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub periods: usize,
    pub periods_failed: usize,
    pub talks_kept: usize,
    pub dropped_incomplete: usize,
    pub dropped_missing_audio: usize,
    pub dropped_unknown_session: usize,
    pub dropped_not_substantive: usize,
    pub speakers: usize,
}

/// Rebuild every speaker bucket from the periods in `[start, end]`.
///
/// On success the store holds exactly the talks of the periods that were
/// fetched. On error the store is unchanged.
pub async fn rebuild(
    store: &dyn Store,
    catalog: Arc<dyn Catalog>,
    canonicalizer: &Canonicalizer,
    start: (i32, u32),
    end: (i32, u32),
    options: IngestOptions,
) -> Result<RebuildSummary, IngestionError> {
    let periods = period::enumerate(start, end);
    if periods.is_empty() {
        return Err(IngestionError::NoPeriods);
    }
    info!(
        catalog = catalog.name(),
        periods = periods.len(),
        first = %periods[0],
        last = %periods[periods.len() - 1],
        "rebuilding speaker index"
    );

    let fetched = fetch_all(catalog, &periods, options.concurrency).await;

    let mut summary = RebuildSummary {
        periods: periods.len(),
        ..Default::default()
    };
    let mut listings: Vec<(Period, Vec<RawTalkRecord>)> = Vec::with_capacity(periods.len());
    let mut first_failure: Option<(Period, FetchError)> = None;
    for (period, result) in periods.iter().copied().zip(fetched) {
        match result {
            Ok(talks) => listings.push((period, talks)),
            Err(e) => {
                warn!(%period, error = %e, "period fetch failed, skipping");
                summary.periods_failed += 1;
                if first_failure.is_none() {
                    first_failure = Some((period, e));
                }
            }
        }
    }

    if listings.is_empty() {
        return Err(IngestionError::AllPeriodsFailed {
            attempted: periods.len(),
        });
    }
    if options.failure_policy == FailurePolicy::AnyFailed {
        if let Some((period, source)) = first_failure {
            return Err(IngestionError::PeriodFailed { period, source });
        }
    }

    let buckets = aggregate(canonicalizer, listings, &mut summary);

    store
        .replace_speaker_buckets(&buckets)
        .await
        .map_err(IngestionError::Store)?;

    info!(
        periods_ok = summary.periods - summary.periods_failed,
        periods_failed = summary.periods_failed,
        talks = summary.talks_kept,
        speakers = summary.speakers,
        dropped_incomplete = summary.dropped_incomplete,
        dropped_missing_audio = summary.dropped_missing_audio,
        dropped_unknown_session = summary.dropped_unknown_session,
        dropped_not_substantive = summary.dropped_not_substantive,
        "speaker index rebuilt"
    );
    Ok(summary)
}

/// Fetch every period with at most `concurrency` requests in flight.
///
/// The returned vector is indexed like `periods`.
async fn fetch_all(
    catalog: Arc<dyn Catalog>,
    periods: &[Period],
    concurrency: usize,
) -> Vec<Result<Vec<RawTalkRecord>, FetchError>> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (index, period) in periods.iter().copied().enumerate() {
        let catalog = Arc::clone(&catalog);
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    debug!(%period, "fetching");
                    catalog.fetch(period).await
                }
                Err(e) => Err(FetchError::Transport {
                    target: period.to_string(),
                    message: e.to_string(),
                }),
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<Result<Vec<RawTalkRecord>, FetchError>>> =
        (0..periods.len()).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!(error = %e, "fetch task did not complete"),
        }
    }

    slots
        .into_iter()
        .zip(periods)
        .map(|(slot, period)| {
            slot.unwrap_or_else(|| {
                Err(FetchError::Transport {
                    target: period.to_string(),
                    message: "fetch task aborted".to_string(),
                })
            })
        })
        .collect()
}

/// Normalize, filter, and group listings by canonical speaker.
fn aggregate(
    canonicalizer: &Canonicalizer,
    listings: Vec<(Period, Vec<RawTalkRecord>)>,
    summary: &mut RebuildSummary,
) -> SpeakerBuckets {
    let mut buckets = SpeakerBuckets::new();
    for (period, talks) in listings {
        for raw in &talks {
            match canonicalizer.normalize(period, raw) {
                Ok(talk) => {
                    summary.talks_kept += 1;
                    buckets.entry(talk.speaker.clone()).or_default().push(talk);
                }
                Err(DropReason::Incomplete) => {
                    debug!(%period, title = %raw.title, speaker = %raw.speaker, "incomplete record");
                    summary.dropped_incomplete += 1;
                }
                Err(DropReason::MissingAudio) => summary.dropped_missing_audio += 1,
                Err(DropReason::UnknownSession) => {
                    debug!(%period, session = %raw.session, title = %raw.title, "unknown session");
                    summary.dropped_unknown_session += 1;
                }
                Err(DropReason::NotSubstantive) => summary.dropped_not_substantive += 1,
            }
        }
    }
    summary.speakers = buckets.len();
    buckets
}
