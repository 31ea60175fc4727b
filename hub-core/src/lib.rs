//! Invention catalog state engine with AI-assisted content.
//!
//! This crate provides:
//! - The [`Hub`] state container: inventions, essence and upgrades,
//!   written through to a [`KeyValueStore`] on every change
//! - Deterministic analytics and display ordering
//! - The [`ContentService`] boundary to a generative service, with a
//!   Claude-backed implementation
//! - The [`Lab`] controller that turns service replies into hub changes
//!
//! # Quick Start
//!
//! ```ignore
//! use hub_core::{FileStore, GenAiService, Hub, HubConfig, Lab, SynthesisFormat};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Hub::open(FileStore::new("saves"), HubConfig::default());
//!     let lab = Lab::new(hub, Arc::new(GenAiService::from_env()?));
//!
//!     let id = lab
//!         .synthesize("self-healing mesh radio", &SynthesisFormat::TacticalBrief)
//!         .await?;
//!     println!("{:?}", lab.hub().await.invention(&id));
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod hub;
pub mod invention;
pub mod lab;
pub mod persist;
pub mod service;
pub mod sort;
pub mod testing;
pub mod upgrade;

// Primary public API
pub use analytics::{analyze, Analysis};
pub use config::{HubConfig, ServiceConfig};
pub use hub::{Hub, HubError, Purchase, Rejection};
pub use invention::{Draft, Invention, InventionId, Origin, ScoreProfile, ScoreRule, Status};
pub use lab::{Lab, LabError, RequestKind};
pub use persist::{FileStore, KeyValueStore, MemoryStore, PersistError, Persistence, Snapshot};
pub use service::{
    AuditReport, ContentService, GenAiService, RiskLevel, ServiceError, SynthesisFormat,
    SynthesisReply, Vulnerability,
};
pub use sort::{SortOrder, UnknownSortOrder};
pub use testing::MockService;
pub use upgrade::Upgrade;
