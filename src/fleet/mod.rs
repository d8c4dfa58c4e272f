//! Per-car state owned by the car actor, and the fleet-wide registry owned by
//! the scheduler and kept coherent with car telemetry.

pub mod car_state;
pub mod registry;

pub use car_state::{CarState, MotionMode};
pub use registry::{CarRecord, FleetRegistry};
