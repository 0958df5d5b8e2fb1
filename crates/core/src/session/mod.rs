//! # Session
//!
//! Bootstrap and workflow orchestration for one try-on session.
//!
//! ## Flow
//!
//! ```text
//! bootstrap ─┬─ health   ─┐
//!            ├─ identity ─┼─► select ─► commit ─┐
//!            └─ catalog  ─┘      pick ──────────┴─► generate ─► Completed | Failed
//! ```

pub mod bootstrap;
pub mod coordinator;
pub mod events;

pub use bootstrap::{BootstrapSummary, IDENTITY_FAILURE_MESSAGE};
pub use coordinator::{
    AssetView, GenerateOutcome, SessionSnapshot, TryOnSession, EMPTY_OUTPUT_MESSAGE,
    GENERATION_FAILURE_MESSAGE,
};
pub use events::{SessionEvent, SessionEventKind};
