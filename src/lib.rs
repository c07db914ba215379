//! # Speakercast
//!
//! **A speaker-indexed store of conference talks, refreshed from a remote
//! catalog only when the catalog changes.**
//!
//! Conferences happen twice a year, each with several sessions of talks.
//! Speakercast pulls every conference from a catalog, cleans up speaker
//! names and session labels, drops procedural entries and talks without
//! audio, and stores the result keyed by speaker. Feed generators and
//! listing pages read from that store and address speaker sets by short
//! shareable ids.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────┐   ┌──────────┐
//! │   Catalog    │──▶│  Ingestion pipeline   │──▶│  SQLite  │
//! │ HTTP / dir   │   │ fetch ▸ clean ▸ group │   │  store   │
//! └──────┬───────┘   └──────────▲───────────┘   └────┬─────┘
//!        │ version              │ if stale           │
//!        └────────────▶ ┌───────┴──────┐      ┌──────▼──────┐
//!                       │   Updater    │      │ SpeakerIndex│
//!                       └──────────────┘      │  + ids      │
//!                                             └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`catalog`] | Catalog construction and wire documents |
//! | [`catalog_http`] | HTTP catalog (reqwest) |
//! | [`catalog_fs`] | Directory-of-JSON catalog |
//! | [`ingest`] | Concurrent fetch, normalization, and atomic rebuild |
//! | [`update`] | Version-gated refresh |
//! | [`index`] | Read facade: speakers, talks, ids |
//! | [`sqlite_store`] | SQLite [`Store`](speakercast_core::store::Store) backend |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Database schema migrations (idempotent) |
//!
//! Pure logic (canonicalization, periods, filter, registry, in-memory
//! store) lives in [`speakercast_core`].

pub mod catalog;
pub mod catalog_fs;
pub mod catalog_http;
pub mod config;
pub mod db;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod sqlite_store;
pub mod update;

pub use index::SpeakerIndex;
pub use speakercast_core::{canonical, models, period, registry, store};
