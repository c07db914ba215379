//! # Speakercast Core
//!
//! Runtime-agnostic logic for Speakercast: talk models, speaker and session
//! canonicalization, period enumeration, record filtering, the catalog and
//! store abstractions, and the speaker-set id registry.
//!
//! This crate contains no tokio, sqlx, network, or filesystem I/O. The
//! `speakercast` crate supplies the SQLite store, catalog adaptors, and the
//! concurrent ingestion pipeline on top of it.

pub mod canonical;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod models;
pub mod period;
pub mod registry;
pub mod store;
