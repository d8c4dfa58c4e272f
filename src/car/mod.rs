//! The car actor: one elevator's motion/door state machine plus the subsystem
//! task that owns its socket — two tasks sharing a channel rather than a
//! parent/child object graph.

pub mod actor;
pub mod subsystem;

pub use actor::CarActor;
pub use subsystem::CarSubsystem;
