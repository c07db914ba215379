//! Short, shareable ids for speaker sets.
//!
//! A feed for "Holland and Uchtdorf" is addressed by a short token rather
//! than a list of names. [`IdRegistry::id_for`] assigns that token:
//!
//! 1. Deduplicate and sort the speakers (so `{A, B}` and `{B, A}` agree).
//! 2. Return the existing id if the set was seen before.
//! 3. Otherwise draw candidates from the generator and insert the first
//!    one the store accepts. A candidate that collides with another set's
//!    id is discarded; a concurrent caller that registered the same set
//!    first wins and its id is returned.
//!
//! The store's insert is a compare-and-swap keyed by both the id and the
//! speaker set, so concurrent identical requests converge on one id.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use crate::error::IdGenerationError;
use crate::models::{speakers_key, IdMapping};
use crate::store::{InsertOutcome, Store};

/// Candidate id source.
pub type IdGenerator = Box<dyn Fn() -> String + Send + Sync>;

pub const DEFAULT_ID_LENGTH: usize = 8;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Characters an id is drawn from, each equally likely.
pub const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Fixed-width random tokens over [`ID_CHARSET`].
pub fn random_id_generator(length: usize) -> IdGenerator {
    Box::new(move || {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| char::from(ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())]))
            .collect()
    })
}

/// Deduplicate and sort a speaker collection.
pub fn canonical_speakers<I, S>(speakers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    speakers
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Store-backed mapping between speaker sets and ids.
pub struct IdRegistry {
    store: Arc<dyn Store>,
    generator: IdGenerator,
    max_attempts: u32,
}

impl IdRegistry {
    /// Registry with [`random_id_generator`] of [`DEFAULT_ID_LENGTH`].
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_generator(store, random_id_generator(DEFAULT_ID_LENGTH), DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_generator(store: Arc<dyn Store>, generator: IdGenerator, max_attempts: u32) -> Self {
        Self {
            store,
            generator,
            max_attempts,
        }
    }

    /// The id for `speakers`, creating one on first request.
    pub async fn id_for<I, S>(&self, speakers: I) -> Result<String, IdGenerationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let speakers = canonical_speakers(speakers);
        if speakers.is_empty() {
            return Err(IdGenerationError::EmptySpeakerSet);
        }
        let key = speakers_key(&speakers);

        if let Some(id) = self
            .store
            .find_id(&key)
            .await
            .map_err(IdGenerationError::Store)?
        {
            return Ok(id);
        }

        let mut mapping = IdMapping {
            id: String::new(),
            speakers,
        };
        for attempt in 1..=self.max_attempts {
            mapping.id = (self.generator)();
            match self
                .store
                .insert_id_mapping(&mapping)
                .await
                .map_err(IdGenerationError::Store)?
            {
                InsertOutcome::Inserted => {
                    info!(id = %mapping.id, speakers = ?mapping.speakers, "registered id");
                    return Ok(mapping.id);
                }
                InsertOutcome::SpeakersExist(id) => return Ok(id),
                InsertOutcome::IdTaken => {
                    debug!(candidate = %mapping.id, attempt, "id collision, retrying");
                }
            }
        }

        Err(IdGenerationError::Exhausted {
            attempts: self.max_attempts,
        })
    }

    /// The speaker set registered under `id`, if any.
    pub async fn speakers_for(&self, id: &str) -> anyhow::Result<Option<Vec<String>>> {
        Ok(self.store.id_mapping(id).await?.map(|m| m.speakers))
    }

    /// Forget every mapping. Returns how many were removed.
    pub async fn clear(&self) -> anyhow::Result<u64> {
        self.store.clear_id_mappings().await
    }
}
