//! # Rapport Core Library
//!
//! Relationship memory for conversational agents.
//!
//! Every user gets a [`RelationshipRecord`] that evolves with each
//! interaction:
//!
//! - **Phase**: "How close are we" (stranger → acquaintance → familiar → trusted)
//! - **Episodes**: "What we went through" (bounded long-term memory)
//! - **Adaptive profile**: "How you like to talk" (tone, depth, topics)
//!
//! The [`RelationshipMemory`] orchestrator runs the per-turn pipeline and
//! renders the result into a system prompt for a downstream model.
//! Emotion, topic and fact detection happen upstream; this crate only
//! consumes their output.
//!
//! ```no_run
//! use rapport_core::{Interaction, RapportConfig, RelationshipMemory};
//!
//! let memory = RelationshipMemory::open_sqlite("relationships.db", RapportConfig::default())?;
//! memory.process_interaction(
//!     &Interaction::new("user-1", "Work has been rough this week")
//!         .with_topics(["work"])
//!         .with_emotion("stress", 0.6),
//! )?;
//! let prompt = memory.generate_system_prompt("user-1")?;
//! # Ok::<(), rapport_core::RapportError>(())
//! ```

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod adaptive;
pub mod config;
pub mod decay;
pub mod episodes;
pub mod error;
pub mod eviction;
pub mod memory;
pub mod metrics;
pub mod orchestrator;
pub mod persistence;
pub mod phase;
pub mod prompt;
pub mod retrieval;
pub mod telemetry;
pub mod types;

pub use config::RapportConfig;
pub use error::{RapportError, Result};
pub use memory::{AdaptiveProfile, Episode, RelationshipRecord, RelationshipState};
pub use orchestrator::{Interaction, RelationshipMemory, RelationshipSummary};
pub use persistence::{MemoryStore, RelationshipStore, SqliteStore};
pub use types::*;
