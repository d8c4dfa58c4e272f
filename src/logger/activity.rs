//! The structured events every component logs, independent of the sink.

use serde::{Deserialize, Serialize};

use crate::wire::event::{Fault, HallDirection};

/// Severity of a logged activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// One structured activity event, timestamped and dispatched to the logger
/// thread. Field-free variants intentionally carry nothing beyond what's
/// needed to reconstruct the decision from the log alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActivityEvent {
    /// The floor injector read a hall call out of the input file.
    HallCallInjected {
        origin_floor: i32,
        direction: HallDirection,
        fault: Fault,
    },
    /// The scheduler picked `car_id` for a hall call.
    AssignmentDecided {
        car_id: u32,
        origin_floor: i32,
        direction: HallDirection,
        score: i64,
    },
    /// A car's telemetry reached the scheduler.
    TelemetryReceived {
        car_id: u32,
        current_floor: i32,
        is_complete: bool,
    },
    /// A car hit `CAR_STUCK`: recovered, stayed in service.
    CarStuckRecovered { car_id: u32 },
    /// A car hit `ARRIVAL_SENSOR`: permanently decommissioned.
    CarDecommissioned { car_id: u32 },
    /// The floor injector observed the final outstanding completion.
    RunComplete {
        total_injected: u64,
        completed: u64,
    },
    /// A transport-layer send/recv failure, logged and swallowed by the caller.
    TransportError { component: String, details: String },
    /// The run started.
    RunStarted { num_elevators: u32, input_file: String },
}

impl ActivityEvent {
    /// Severity this event should be logged at.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::CarStuckRecovered { .. } | Self::TransportError { .. } => Severity::Warning,
            Self::CarDecommissioned { .. } => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decommission_is_critical_and_transport_error_is_warning() {
        assert_eq!(
            ActivityEvent::CarDecommissioned { car_id: 1 }.severity(),
            Severity::Critical
        );
        assert_eq!(
            ActivityEvent::TransportError {
                component: "car-1".into(),
                details: "timeout".into(),
            }
            .severity(),
            Severity::Warning
        );
        assert_eq!(
            ActivityEvent::RunStarted {
                num_elevators: 4,
                input_file: "in.txt".into(),
            }
            .severity(),
            Severity::Info
        );
    }

    #[test]
    fn serializes_with_tagged_event_field() {
        let json = serde_json::to_string(&ActivityEvent::CarDecommissioned { car_id: 2 }).unwrap();
        assert!(json.contains("\"event\":\"car_decommissioned\""));
        assert!(json.contains("\"car_id\":2"));
    }
}
