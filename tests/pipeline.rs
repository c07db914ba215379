mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use speakercast::canonical::{Canonicalizer, Session};
use speakercast::config::FailurePolicy;
use speakercast::ingest::{self, IngestOptions};
use speakercast::models::SpeakerCount;
use speakercast::period::{Half, Period};
use speakercast::registry::IdRegistry;
use speakercast::store::memory::InMemoryStore;
use speakercast::store::Store;
use speakercast::update::{RefreshOutcome, UpdateError};
use speakercast::SpeakerIndex;
use speakercast_core::error::{IdGenerationError, IngestionError};

use common::{raw_talk, updater, FakeCatalog, FlakyStore};

const P1: Period = Period {
    year: 2020,
    half: Half::First,
};
const P2: Period = Period {
    year: 2020,
    half: Half::Second,
};
const P3: Period = Period {
    year: 2021,
    half: Half::First,
};

fn index_over(store: Arc<InMemoryStore>, catalog: Arc<FakeCatalog>) -> SpeakerIndex {
    SpeakerIndex::new(
        store.clone(),
        IdRegistry::new(store.clone()),
        updater(store, catalog, IngestOptions::default()),
    )
}

#[tokio::test]
async fn test_end_to_end_single_period() {
    let catalog = Arc::new(FakeCatalog::new("v1").with_listing(
        P1,
        vec![
            raw_talk("Faith", "Elder A", "Saturday Morning Session", true),
            raw_talk("Hope", "Bishop B", "Saturday Morning Session", false),
        ],
    ));
    let store = Arc::new(InMemoryStore::new());
    let index = index_over(store, catalog);

    let outcome = index.update_database(false).await.unwrap();
    assert!(outcome.rebuilt());

    let counts = index.all_speakers_and_counts().await.unwrap();
    assert_eq!(
        counts,
        vec![SpeakerCount {
            count: 1,
            speaker: "A".to_string()
        }]
    );

    let talks = index.talks(&["A"]).await.unwrap();
    assert_eq!(talks.len(), 1);
    assert_eq!(talks[0].speaker, "A");
    assert_eq!(talks[0].session, Session::SaturdayMorning);
    assert_eq!(talks[0].scheduled_time.to_rfc3339(), "2020-04-04T10:00:00-06:00");
    assert_eq!(talks[0].audio_size, 1024);

    assert!(index.talks(&["B"]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_procedural_entries_and_unknown_sessions_dropped() {
    let catalog = Arc::new(FakeCatalog::new("v1").with_listing(
        P1,
        vec![
            raw_talk("Welcome to Conference", "President C", "Saturday Morning Session", true),
            raw_talk("Statistical Report, 2019", "Brother D", "Saturday Afternoon Session", true),
            raw_talk("Grace", "Elder E", "Midweek Devotional", true),
            raw_talk("Charity", "Elder F", "Sunday Morning Session", true),
        ],
    ));
    let store = Arc::new(InMemoryStore::new());
    let updater = updater(store.clone(), catalog, IngestOptions::default());

    let summary = match updater.refresh(false).await.unwrap() {
        RefreshOutcome::Rebuilt { summary, .. } => summary,
        other => panic!("expected a rebuild, got {:?}", other),
    };
    assert_eq!(summary.periods, 4);
    assert_eq!(summary.talks_kept, 1);
    assert_eq!(summary.dropped_not_substantive, 2);
    assert_eq!(summary.dropped_unknown_session, 1);

    let counts = store.speaker_counts().await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].speaker, "F");
    assert!(store.talks_for("C").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bucket_order_follows_periods() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P3, vec![raw_talk("Third", "Elder A", "Sunday Morning Session", true)])
            .with_listing(P1, vec![raw_talk("First", "Elder A", "Saturday Morning Session", true)])
            .with_listing(P2, vec![raw_talk("Second", "Elder A", "Priesthood Session", true)]),
    );
    let store = InMemoryStore::new();
    let options = IngestOptions {
        concurrency: 4,
        ..Default::default()
    };

    ingest::rebuild(&store, catalog, &Canonicalizer::default(), (2020, 4), (2021, 10), options)
        .await
        .unwrap();

    let titles: Vec<String> = store
        .talks_for("A")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_rebuild_replaces_previous_buckets() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Old", "Elder Old", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(InMemoryStore::new());
    let updater = updater(store.clone(), catalog.clone(), IngestOptions::default());
    updater.refresh(false).await.unwrap();

    catalog.set_version("v2");
    catalog.set_listing(P1, vec![raw_talk("New", "Elder New", "Sunday Morning Session", true)]);
    updater.refresh(false).await.unwrap();

    assert!(store.talks_for("Old").await.unwrap().is_empty());
    assert_eq!(store.talks_for("New").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_range_is_rejected() {
    let catalog = Arc::new(FakeCatalog::new("v1"));
    let store = InMemoryStore::new();
    let err = ingest::rebuild(
        &store,
        catalog.clone(),
        &Canonicalizer::default(),
        (2021, 11),
        (2021, 10),
        IngestOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IngestionError::NoPeriods));
    assert_eq!(catalog.fetches(), 0);
}

#[tokio::test]
async fn test_all_periods_failing_keeps_previous_data() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(InMemoryStore::new());
    let updater = updater(store.clone(), catalog.clone(), IngestOptions::default());
    updater.refresh(false).await.unwrap();

    catalog.set_version("v2");
    for year in [2020, 2021] {
        catalog.fail(Period::new(year, Half::First));
        catalog.fail(Period::new(year, Half::Second));
    }
    let err = updater.refresh(false).await.unwrap_err();
    assert!(matches!(
        err,
        UpdateError::Ingestion(IngestionError::AllPeriodsFailed { attempted: 4 })
    ));
    assert_eq!(store.talks_for("A").await.unwrap().len(), 1);
    assert_eq!(store.metadata().await.unwrap().unwrap().version, "v1");

    catalog.recover();
    match updater.refresh(false).await.unwrap() {
        RefreshOutcome::Rebuilt { version, .. } => assert_eq!(version, "v2"),
        other => panic!("expected a rebuild, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_failed_period_is_skipped() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)])
            .with_listing(P2, vec![raw_talk("Hope", "Elder B", "Sunday Morning Session", true)]),
    );
    catalog.fail(P2);
    let store = Arc::new(InMemoryStore::new());
    let updater = updater(store.clone(), catalog, IngestOptions::default());

    match updater.refresh(false).await.unwrap() {
        RefreshOutcome::Rebuilt { version, summary } => {
            assert_eq!(version, "v1");
            assert_eq!(summary.periods_failed, 1);
            assert_eq!(summary.talks_kept, 1);
        }
        other => panic!("expected a rebuild, got {:?}", other),
    }
    assert_eq!(store.talks_for("A").await.unwrap().len(), 1);
    assert!(store.talks_for("B").await.unwrap().is_empty());
    assert_eq!(store.metadata().await.unwrap().unwrap().version, "v1");
}

#[tokio::test]
async fn test_strict_policy_aborts_on_any_failure() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)]),
    );
    catalog.fail(P3);
    let store = Arc::new(InMemoryStore::new());
    let options = IngestOptions {
        failure_policy: FailurePolicy::AnyFailed,
        ..Default::default()
    };
    let updater = updater(store.clone(), catalog, options);

    let err = updater.refresh(false).await.unwrap_err();
    match err {
        UpdateError::Ingestion(IngestionError::PeriodFailed { period, .. }) => assert_eq!(period, P3),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(store.speaker_counts().await.unwrap().is_empty());
    assert!(store.metadata().await.unwrap().is_none());
}

#[tokio::test]
async fn test_version_gate() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(InMemoryStore::new());
    let updater = updater(store.clone(), catalog.clone(), IngestOptions::default());

    assert!(updater.refresh_if_stale(false).await.unwrap());
    assert_eq!(catalog.fetches(), 4);

    assert!(!updater.refresh_if_stale(false).await.unwrap());
    assert_eq!(catalog.fetches(), 4);

    assert!(updater.refresh_if_stale(true).await.unwrap());
    assert_eq!(catalog.fetches(), 8);

    catalog.set_version("v2");
    assert!(updater.refresh_if_stale(false).await.unwrap());
    assert_eq!(store.metadata().await.unwrap().unwrap().version, "v2");
}

#[tokio::test]
async fn test_store_failure_leaves_version_untouched() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(FlakyStore::default());
    let updater = updater(store.clone(), catalog.clone(), IngestOptions::default());
    updater.refresh(false).await.unwrap();

    catalog.set_version("v2");
    catalog.set_listing(P1, vec![]);
    store.fail_replace.store(true, Ordering::SeqCst);

    let err = updater.refresh(false).await.unwrap_err();
    assert!(matches!(err, UpdateError::Ingestion(IngestionError::Store(_))));
    assert_eq!(store.metadata().await.unwrap().unwrap().version, "v1");
    assert_eq!(store.talks_for("A").await.unwrap().len(), 1);

    store.fail_replace.store(false, Ordering::SeqCst);
    assert!(updater.refresh_if_stale(false).await.unwrap());
    assert!(store.talks_for("A").await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_rebuild_once() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(InMemoryStore::new());
    let updater = Arc::new(updater(store, catalog.clone(), IngestOptions::default()));

    let (a, b) = tokio::join!(updater.refresh(false), updater.refresh(false));
    let rebuilt = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|o| o.rebuilt())
        .count();
    assert_eq!(rebuilt, 1);
    assert_eq!(catalog.fetches(), 4);
}

#[tokio::test]
async fn test_ids_through_index() {
    let catalog = Arc::new(FakeCatalog::new("v1"));
    let store = Arc::new(InMemoryStore::new());
    let index = index_over(store, catalog);

    let id = index.generate_id(&["B", "A"]).await.unwrap();
    assert_eq!(index.generate_id(&["A", "B", "A"]).await.unwrap(), id);
    assert_eq!(
        index.speakers(&id).await.unwrap(),
        Some(vec!["A".to_string(), "B".to_string()])
    );
    assert_eq!(index.speakers("unknown").await.unwrap(), None);

    let none: [&str; 0] = [];
    assert!(matches!(
        index.generate_id(&none).await,
        Err(IdGenerationError::EmptySpeakerSet)
    ));

    assert_eq!(index.clear_ids().await.unwrap(), 1);
    assert_eq!(index.speakers(&id).await.unwrap(), None);
}

#[tokio::test]
async fn test_talks_for_speaker_set() {
    let catalog = Arc::new(FakeCatalog::new("v1").with_listing(
        P1,
        vec![
            raw_talk("Faith", "Elder A", "Saturday Morning Session", true),
            raw_talk("Hope", "Elder B", "Sunday Morning Session", true),
            raw_talk("Charity", "Elder A", "Sunday Afternoon Session", true),
        ],
    ));
    let store = Arc::new(InMemoryStore::new());
    let index = index_over(store, catalog);
    index.update_database(false).await.unwrap();

    let counts = index.all_speakers_and_counts().await.unwrap();
    assert_eq!(counts[0].speaker, "A");
    assert_eq!(counts[0].count, 2);

    let talks = index.talks(&["B", "A", "B"]).await.unwrap();
    let titles: Vec<&str> = talks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Hope", "Faith", "Charity"]);

    assert!(index.talks(&["Nobody"]).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_updaters_sharing_a_store_rebuild_once() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Faith", "Elder A", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(InMemoryStore::new());
    let first = updater(store.clone(), catalog.clone(), IngestOptions::default());
    let second = updater(store.clone(), catalog.clone(), IngestOptions::default());

    let (a, b) = tokio::join!(first.refresh_if_stale(false), second.refresh_if_stale(false));
    let rebuilt = [a.unwrap(), b.unwrap()];
    assert_eq!(rebuilt.iter().filter(|r| **r).count(), 1);
    assert_eq!(catalog.fetches(), 4);
    assert_eq!(store.metadata().await.unwrap().unwrap().version, "v1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_indexes_sharing_a_store_keep_data_and_version_together() {
    let catalog = Arc::new(
        FakeCatalog::new("v1")
            .with_listing(P1, vec![raw_talk("Old", "Elder Old", "Sunday Morning Session", true)]),
    );
    let store = Arc::new(InMemoryStore::new());
    let first = index_over(store.clone(), catalog.clone());
    let second = index_over(store.clone(), catalog.clone());
    first.update_database(false).await.unwrap();

    catalog.set_version("v2");
    catalog.set_listing(P1, vec![raw_talk("New", "Elder New", "Sunday Morning Session", true)]);
    let (a, b) = tokio::join!(first.update_database(true), second.update_database(false));
    a.unwrap();
    b.unwrap();

    assert_eq!(store.metadata().await.unwrap().unwrap().version, "v2");
    assert!(store.talks_for("Old").await.unwrap().is_empty());
    assert_eq!(store.talks_for("New").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_incomplete_records_are_dropped_not_fatal() {
    let mut no_speaker = raw_talk("Hope", "", "Sunday Morning Session", true);
    no_speaker.speaker = "Elder ".to_string();
    let mut no_url = raw_talk("Grace", "Elder C", "Sunday Morning Session", true);
    no_url.url.clear();

    let catalog = Arc::new(FakeCatalog::new("v1").with_listing(
        P1,
        vec![
            no_speaker,
            raw_talk("Faith", "Elder A", "Saturday Morning Session", true),
            no_url,
        ],
    ));
    let store = Arc::new(InMemoryStore::new());
    let updater = updater(store.clone(), catalog, IngestOptions::default());

    match updater.refresh(false).await.unwrap() {
        RefreshOutcome::Rebuilt { summary, .. } => {
            assert_eq!(summary.talks_kept, 1);
            assert_eq!(summary.dropped_incomplete, 2);
        }
        other => panic!("expected a rebuild, got {:?}", other),
    }
    let counts = store.speaker_counts().await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].speaker, "A");
}
