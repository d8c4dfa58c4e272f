#![forbid(unsafe_code)]

//! liftsim — a multi-elevator dispatcher simulator.
//!
//! Four concurrent actor kinds talk over a connectionless datagram fabric on
//! loopback: a floor injector reads a scripted workload and emits hall calls,
//! a scheduler assigns each call to a car and keeps a fleet-state registry
//! coherent with telemetry, and N car actors simulate motion, doors, and
//! passenger exchange while injecting the scripted faults.

pub mod car;
pub mod core;
pub mod fleet;
pub mod floor;
pub mod logger;
pub mod scheduler;
pub mod supervisor;
pub mod wire;
