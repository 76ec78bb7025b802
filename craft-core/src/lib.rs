//! Craft journal engine with AI image insights.
//!
//! This crate provides:
//! - Six craft modes, each with its own stages and material types
//! - Journal entries, a per-mode material inventory and local accounts
//! - Derived views and text search over entries
//! - Key/value persistence with in-memory and file-backed stores
//! - Image analysis using Claude, degrading to a fixed fallback
//!
//! # Quick Start
//!
//! ```ignore
//! use craft_core::{AppConfig, Journal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let mut journal = Journal::open(config.open_store()?, config.analyzer())?;
//!
//!     journal.begin_entry(Some(craft_core::image::encode_file("bowl.jpg")?));
//!     let entry = journal.confirm_entry().await?;
//!     println!("{:?}", entry.map(|e| &e.title));
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod editor;
pub mod headless;
pub mod image;
pub mod insight;
pub mod journal;
pub mod mode;
pub mod model;
pub mod store;
pub mod testing;
pub mod views;

// Primary public API
pub use config::{AppConfig, ConfigError};
pub use editor::{EntryEditor, MaterialEditor};
pub use headless::HeadlessJournal;
pub use insight::{Analyzer, ClaudeAnalyzer, Insight, OfflineAnalyzer};
pub use journal::{AuthForm, AuthMode, Journal, JournalError, Section, View};
pub use mode::{CraftMode, StageKind};
pub use model::{CraftEntry, EntryDraft, Material, MaterialDraft, UserAccount};
pub use store::{FileStore, MemoryStore, Store, StoreError};
pub use testing::{MockAnalyzer, MockResponse, TestHarness};
pub use views::{SearchFilter, StageFilter};
