//! The TACS coordinator: an actor-owned state machine that routes agent
//! messages, runs consensus rounds, and hosts the synchronous fast path.
//!
//! All mutable state lives inside one task; callers interact through a
//! cloneable [`CoordinatorHandle`] whose commands are serialized by the
//! mailbox. Consensus collection runs in detached tasks so slow agents
//! never block routing.

pub mod broadcast;
pub mod coordinator;
pub mod error;
pub mod fast_path;

pub use broadcast::{BroadcastSink, NullBroadcast, RecordingBroadcast};
pub use coordinator::{
    spawn_coordinator, AgentFactory, CoordinatorHandle, CoordinatorStatus, SubmitReceipt,
};
pub use error::CoordinatorError;
pub use fast_path::{FastPathEngine, FastPathError};
