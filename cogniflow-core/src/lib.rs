//! # cogniflow-core
//!
//! Core library for cogniflow - a browser tab productivity tracker.
//!
//! This library provides:
//! - Domain types for tab records, rules, workspaces and score history
//! - The tab lifecycle [`Engine`]: classification, time accounting,
//!   workspaces, focus mode and session scoring
//! - Key-value persistence with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! The engine sits between two host collaborators, each behind a trait:
//! - **Tab directory** ([`TabDirectory`]): enumerates tabs and executes
//!   open/close/navigate commands
//! - **Classifier** ([`Classifier`]): guesses a category for page text
//!
//! All state lives in a [`KeyValueStore`] and is written only by the engine,
//! one read-modify-write cycle at a time.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cogniflow_core::{
//!     ClassifierAdapter, Config, Engine, InMemoryDirectory, SqliteStore, SystemClock,
//! };
//!
//! # async fn run() -> cogniflow_core::Result<()> {
//! let config = Config::load()?;
//! let store = SqliteStore::open(&Config::database_path())?;
//! let engine = Engine::new(
//!     Arc::new(store),
//!     Arc::new(InMemoryDirectory::new()),
//!     ClassifierAdapter::unavailable(config.classifier.clone()),
//!     Arc::new(SystemClock),
//!     config,
//! )?;
//!
//! let report = engine.analyze_session().await?;
//! println!("score: {}", report.score);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use classifier::{Classification, Classifier, ClassifierAdapter, HttpClassifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{Command, CommandResponse, Event};
pub use config::Config;
pub use directory::{InMemoryDirectory, TabDirectory};
pub use engine::{Engine, StateChange};
pub use error::{Error, Result};
pub use review::Resolution;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::*;

// Public modules
pub mod classifier;
pub mod clock;
pub mod commands;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod focus;
pub mod logging;
pub mod review;
pub mod rules;
pub mod scoring;
pub mod store;
pub mod timekeeping;
pub mod types;
pub mod workspace;
