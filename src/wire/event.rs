//! `Event`: the universal wire message between floor, scheduler, and cars.
//!
//! Ten comma-separated fields, with trimming rules and a source-prefix
//! fallback for `isFromFloor`. Kept as a value type: built by a producer,
//! serialized, parsed by a consumer, discarded.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::{LiftError, Result};

/// Prefix used by every telemetry event's `source` field, e.g. `"Elevator:2"`.
pub const ELEVATOR_SOURCE_PREFIX: &str = "Elevator";

/// Hall-call direction carried in the `floorButton` field. `None` on the wire means
/// "no hall direction" — typical of telemetry with the car at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HallDirection {
    Up,
    Down,
}

impl HallDirection {
    #[must_use]
    pub const fn as_wire_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for HallDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// Fault codes injected with a hall call, latched onto the car that serves it.
///
/// `0=none, 1=car stuck, 2=door-open stuck, 3=door-close stuck, 4=arrival-sensor failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    #[default]
    None,
    CarStuck,
    DoorOpenStuck,
    DoorCloseStuck,
    ArrivalSensor,
}

impl Fault {
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            1 => Self::CarStuck,
            2 => Self::DoorOpenStuck,
            3 => Self::DoorCloseStuck,
            4 => Self::ArrivalSensor,
            _ => Self::None,
        }
    }

    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::CarStuck => 1,
            Self::DoorOpenStuck => 2,
            Self::DoorCloseStuck => 3,
            Self::ArrivalSensor => 4,
        }
    }
}

/// The universal wire message. Field order matches the wire protocol's CSV layout exactly:
/// `time,source,floorButton,elevatorButton,isFromFloor,assignedElevator,currentFloor,riders,isComplete,fault`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Opaque timestamp, passed through untouched; the core never orders on it.
    pub time: String,
    /// A decimal floor number (hall call) or `"Elevator:<id>"` (telemetry).
    pub source: String,
    pub floor_button: Option<HallDirection>,
    pub elevator_button: i32,
    pub is_from_floor: bool,
    pub assigned_elevator: u32,
    pub current_floor: i32,
    pub riders: i32,
    pub is_complete: bool,
    pub fault: Fault,
}

impl Default for Event {
    fn default() -> Self {
        Self {
            time: String::new(),
            source: String::new(),
            floor_button: None,
            elevator_button: 0,
            is_from_floor: false,
            assigned_elevator: 0,
            current_floor: 0,
            riders: 0,
            is_complete: false,
            fault: Fault::None,
        }
    }
}

impl Event {
    /// Build a hall-call event as the floor injector would.
    #[must_use]
    pub fn hall_call(
        time: impl Into<String>,
        origin_floor: i32,
        direction: HallDirection,
        elevator_button: i32,
        fault: Fault,
    ) -> Self {
        Self {
            time: time.into(),
            source: origin_floor.to_string(),
            floor_button: Some(direction),
            elevator_button,
            is_from_floor: true,
            current_floor: origin_floor,
            fault,
            ..Self::default()
        }
    }

    /// `source` formatted the way a car's telemetry does: `"Elevator:<id>"`.
    #[must_use]
    pub fn elevator_source(car_id: u32) -> String {
        format!("{ELEVATOR_SOURCE_PREFIX}:{car_id}")
    }

    /// Whether `source` carries the telemetry prefix convention, independent of the
    /// explicit `isFromFloor` bit. Used as a parse-time fallback.
    #[must_use]
    pub fn source_looks_like_elevator(source: &str) -> bool {
        source.contains(ELEVATOR_SOURCE_PREFIX)
    }

    /// Parse the origin floor out of a hall call's `source` field.
    pub fn origin_floor(&self) -> Result<i32> {
        self.source.trim().parse::<i32>().map_err(|_| LiftError::MalformedEvent {
            details: format!("source {:?} is not a floor number", self.source),
        })
    }

    /// Serialize to the wire's comma-separated byte encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let floor_button = self.floor_button.map_or("", HallDirection::as_wire_str);
        let line = format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.time,
            self.source,
            floor_button,
            self.elevator_button,
            u8::from(self.is_from_floor),
            self.assigned_elevator,
            self.current_floor,
            self.riders,
            u8::from(self.is_complete),
            self.fault.code(),
        );
        line.into_bytes()
    }

    /// Parse a received datagram payload back into an `Event`.
    ///
    /// Trims trailing null bytes (fixed-size receive buffers) and surrounding
    /// whitespace on every field. Missing trailing fields default to their zero
    /// value, matching the C++ original's `std::getline` short-read behavior.
    /// `isFromFloor` falls back to the `source`-prefix convention when the field
    /// is absent or unparsable.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let nul_trimmed = data.split(|&b| b == 0).next().unwrap_or(data);
        let text = std::str::from_utf8(nul_trimmed).map_err(|e| LiftError::MalformedEvent {
            details: format!("non-utf8 payload: {e}"),
        })?;
        let text = text.trim();

        let mut fields = text.split(',').map(str::trim);
        let time = fields.next().unwrap_or_default().to_string();
        let source = fields.next().unwrap_or_default().to_string();
        let floor_button_raw = fields.next().unwrap_or_default();
        let floor_button = match floor_button_raw {
            "" => None,
            "UP" => Some(HallDirection::Up),
            "DOWN" => Some(HallDirection::Down),
            other => {
                return Err(LiftError::MalformedEvent {
                    details: format!("unknown floorButton {other:?}"),
                });
            }
        };

        let elevator_button = parse_required_i32(fields.next(), "elevatorButton")?;

        let is_from_floor_field = fields.next();
        let is_from_floor = match is_from_floor_field.and_then(parse_bit) {
            Some(bit) => bit,
            None => !Self::source_looks_like_elevator(&source),
        };

        let assigned_elevator = parse_optional_u32(fields.next());
        let current_floor = parse_optional_i32(fields.next());
        let riders = parse_optional_i32(fields.next());
        let is_complete = fields.next().and_then(parse_bit).unwrap_or(false);
        let fault = Fault::from_code(parse_optional_i32(fields.next()));

        Ok(Self {
            time,
            source,
            floor_button,
            elevator_button,
            is_from_floor,
            assigned_elevator,
            current_floor,
            riders,
            is_complete,
            fault,
        })
    }
}

fn parse_bit(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

fn parse_required_i32(raw: Option<&str>, field: &'static str) -> Result<i32> {
    let raw = raw.unwrap_or_default();
    raw.parse::<i32>().map_err(|_| LiftError::MalformedEvent {
        details: format!("{field} {raw:?} is not an integer"),
    })
}

fn parse_optional_i32(raw: Option<&str>) -> i32 {
    raw.and_then(|r| r.parse::<i32>().ok()).unwrap_or(0)
}

fn parse_optional_u32(raw: Option<&str>) -> u32 {
    raw.and_then(|r| r.parse::<u32>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_hall_call() {
        let e = Event::hall_call("14:05", 2, HallDirection::Up, 4, Fault::None);
        let bytes = e.to_bytes();
        let back = Event::from_bytes(&bytes).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn round_trip_telemetry_with_empty_floor_button() {
        let e = Event {
            time: "14:06".into(),
            source: Event::elevator_source(2),
            floor_button: None,
            elevator_button: 4,
            is_from_floor: false,
            assigned_elevator: 2,
            current_floor: 4,
            riders: 0,
            is_complete: true,
            fault: Fault::None,
        };
        let bytes = e.to_bytes();
        assert!(bytes.len() <= crate::wire::transport::MAX_DATAGRAM_BYTES);
        let back = Event::from_bytes(&bytes).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn empty_floor_button_encodes_as_adjacent_commas() {
        let e = Event::default();
        let bytes = e.to_bytes();
        let text = std::str::from_utf8(&bytes).unwrap();
        // time="" , source="" , floorButton="" -> leading ",,,"
        assert!(text.starts_with(",,,"), "got {text:?}");
    }

    #[test]
    fn from_bytes_trims_null_padding() {
        let mut padded = Event::hall_call("t", 3, HallDirection::Down, 1, Fault::None).to_bytes();
        padded.resize(100, 0);
        let parsed = Event::from_bytes(&padded).unwrap();
        assert_eq!(parsed.source, "3");
        assert_eq!(parsed.floor_button, Some(HallDirection::Down));
    }

    #[test]
    fn is_from_floor_recovered_from_source_prefix_when_bit_missing() {
        // Only the first four fields present; isFromFloor bit absent entirely.
        let partial = "t,Elevator:1,,0";
        let parsed = Event::from_bytes(partial.as_bytes()).unwrap();
        assert!(!parsed.is_from_floor);

        let partial_floor = "t,5,UP,3";
        let parsed_floor = Event::from_bytes(partial_floor.as_bytes()).unwrap();
        assert!(parsed_floor.is_from_floor);
    }

    #[test]
    fn unknown_floor_button_is_malformed() {
        let err = Event::from_bytes(b"t,1,SIDEWAYS,0,1").unwrap_err();
        assert_eq!(err.code(), "LIFT-2002");
    }

    #[test]
    fn fault_code_round_trips() {
        for code in 0..=4 {
            assert_eq!(Fault::from_code(code).code(), code);
        }
        // Out-of-range codes clamp to None, matching the C++ default-construct behavior.
        assert_eq!(Fault::from_code(99), Fault::None);
    }

    proptest::proptest! {
        #[test]
        fn arbitrary_well_formed_events_round_trip(
            time in "[a-zA-Z0-9:]{0,8}",
            floor in 1i32..200,
            going_up in proptest::bool::ANY,
            elevator_button in 0i32..200,
            assigned in 0u32..16,
            riders in 0i32..10,
            is_complete in proptest::bool::ANY,
            fault_code in 0i32..5,
        ) {
            let direction = if going_up { HallDirection::Up } else { HallDirection::Down };
            let e = Event {
                time,
                source: floor.to_string(),
                floor_button: Some(direction),
                elevator_button,
                is_from_floor: true,
                assigned_elevator: assigned,
                current_floor: floor,
                riders,
                is_complete,
                fault: Fault::from_code(fault_code),
            };
            let bytes = e.to_bytes();
            let back = Event::from_bytes(&bytes).unwrap();
            prop_assert_eq!(e, back);
        }
    }
}
