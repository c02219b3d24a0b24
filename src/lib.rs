//! taskdeck - task graph, search and relocation engine
//!
//! Projects hold lists, tasks and tags stored by a host application as a flat
//! collection of custom module data values. This library derives everything a
//! task board needs from that collection.
//!
//! # Core Concepts
//!
//! - **Record store**: the host's persistence, behind the `RecordStore` trait
//! - **Task graph**: parent index, due-date cascade, completion, integrity checks
//! - **Search & visibility**: fuzzy scoring and per-list view gates
//! - **Recurrence**: interval-based instance creation
//! - **Relocation**: journaled cross-project subtree moves
//!
//! # Module Organization
//!
//! - `actor`: Actor identity resolution
//! - `cli`: Inspection CLI over an exported snapshot
//! - `config`: Configuration loading from `taskdeck.toml`
//! - `diff`: Field diffs recorded in update activity
//! - `error`: Error types and result aliases
//! - `filter`: Visibility, sorting and saved filters
//! - `graph`: Task graph engine
//! - `journal`: Move-intent journal
//! - `lists`, `tags`, `tasks`, `projects`: Typed record adapters
//! - `lock`: File locking and atomic writes
//! - `model`: Record types and option catalogs
//! - `module`: Module context
//! - `output`: CLI output envelope
//! - `recurrence`: Recurring task instances
//! - `relocate`: Cross-project moves
//! - `search`: Fuzzy search
//! - `session`: Per-project session state
//! - `store`: Record store seam and in-memory store

pub mod actor;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod graph;
pub mod journal;
pub mod lists;
pub mod lock;
pub mod model;
pub mod module;
pub mod output;
pub mod projects;
pub mod recurrence;
pub mod relocate;
pub mod search;
pub mod session;
pub mod store;
pub mod tags;
pub mod tasks;

pub use error::{Error, Result};
