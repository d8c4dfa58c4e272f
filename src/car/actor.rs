//! `CarActor`: the per-car motion/door/fault state machine.
//!
//! Owns a [`CarState`] exclusively and a send-only cloned transport for
//! telemetry; receives assignments over a channel fed by [`super::subsystem::CarSubsystem`].
//! The `moveTo`/`openDoors`/`closeDoors`/`load`/`unload` sequencing is
//! restructured around message passing rather than direct method calls.

use std::net::SocketAddr;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::core::config::TimingConfig;
use crate::core::errors::{LiftError, Result};
use crate::core::shutdown::ShutdownFlag;
use crate::fleet::car_state::{CarState, MotionMode};
use crate::logger::{ActivityEvent, ActivityLogger};
use crate::wire::event::{Event, Fault, HallDirection};
use crate::wire::transport::DatagramTransport;

/// Outcome of attempting to move a car to its assignment's destination floor.
enum MoveOutcome {
    Arrived,
    /// `CAR_STUCK`: recovered after a delay, stayed in service.
    Recovered,
    /// `ARRIVAL_SENSOR`: permanently decommissioned.
    Decommissioned,
}

/// A single elevator car's actor loop.
pub struct CarActor {
    state: CarState,
    rx: Receiver<Event>,
    transport: DatagramTransport,
    scheduler_addr: SocketAddr,
    timing: TimingConfig,
    capacity: u32,
    logger: ActivityLogger,
    shutdown: ShutdownFlag,
}

impl CarActor {
    #[must_use]
    pub fn new(
        car_id: u32,
        rx: Receiver<Event>,
        transport: DatagramTransport,
        scheduler_addr: SocketAddr,
        timing: TimingConfig,
        capacity: u32,
        logger: ActivityLogger,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            state: CarState::new(car_id),
            rx,
            transport,
            scheduler_addr,
            timing,
            capacity,
            logger,
            shutdown,
        }
    }

    /// Spawn the actor's thread, consuming `self`.
    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let name = format!("liftsim-car-{}", self.state.car_id);
        std::thread::Builder::new()
            .name(name)
            .spawn(move || self.run())
            .map_err(|source| LiftError::Runtime {
                details: format!("failed to spawn car actor thread: {source}"),
            })
    }

    fn run(mut self) {
        let poll = Duration::from_millis(self.timing.poll_interval_ms);
        loop {
            match self.rx.recv_timeout(poll) {
                Ok(event) => {
                    if self.process_assignment(event) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.shutdown.is_set() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Run one assignment to completion. Returns `true` if the car has just
    /// been decommissioned and should stop accepting further work.
    ///
    /// The car first travels to the hall call's origin floor (a plain,
    /// fault-free positioning move — faults are injected on the passenger-
    /// carrying leg, matching the worked example's `move(1→2)→move(2→4)`
    /// timing without attributing a fault to the approach leg; see
    /// `DESIGN.md`), then runs open→load→close→moveTo(destination)→open→
    /// unload→close→emit exactly as the run-loop sequence names it.
    fn process_assignment(&mut self, event: Event) -> bool {
        self.state.assigned = Some(event.clone());

        self.travel_to(event.current_floor);
        self.open_doors(&event);
        self.load(&event);
        self.close_doors(&event);

        match self.move_to(event.elevator_button, &event) {
            MoveOutcome::Arrived => {
                self.open_doors(&event);
                self.unload(&event);
                self.close_doors(&event);
                self.emit_completion(&event);
                false
            }
            MoveOutcome::Recovered => {
                self.logger.log(ActivityEvent::CarStuckRecovered {
                    car_id: self.state.car_id,
                });
                false
            }
            MoveOutcome::Decommissioned => {
                self.state.decommissioned = true;
                self.logger.log(ActivityEvent::CarDecommissioned {
                    car_id: self.state.car_id,
                });
                true
            }
        }
    }

    /// Unconditional travel to `destination`: no fault check, used for the
    /// approach leg to a hall call's origin floor.
    fn travel_to(&mut self, destination: i32) {
        let delta = (destination - self.state.current_floor).unsigned_abs();
        std::thread::sleep(Duration::from_millis(self.timing.move_between_floors_time(delta)));
        self.state.mode = if destination > self.state.current_floor {
            MotionMode::MovingUp
        } else if destination < self.state.current_floor {
            MotionMode::MovingDown
        } else {
            MotionMode::Rest
        };
        self.state.current_floor = destination;
    }

    /// `moveTo`: car-stuck recovers in place, arrival-sensor decommissions,
    /// otherwise the car travels and its floor advances.
    fn move_to(&mut self, destination: i32, event: &Event) -> MoveOutcome {
        match event.fault {
            Fault::CarStuck => {
                std::thread::sleep(Duration::from_millis(self.timing.recovery_time));
                self.send(self.failure_telemetry(event));
                MoveOutcome::Recovered
            }
            Fault::ArrivalSensor => {
                self.send(self.removal_telemetry(event));
                MoveOutcome::Decommissioned
            }
            _ => {
                self.travel_to(destination);
                MoveOutcome::Arrived
            }
        }
    }

    /// `openDoors`: a door-open-stuck fault latches the open state for the
    /// recovery window instead of the normal dwell time.
    fn open_doors(&mut self, event: &Event) {
        self.state.mode = MotionMode::DoorOpen;
        let dwell = if event.fault == Fault::DoorOpenStuck {
            self.timing.recovery_time
        } else {
            self.timing.time_to_open_close_door
        };
        std::thread::sleep(Duration::from_millis(dwell));
    }

    /// `closeDoors`: symmetric to `open_doors` for `DOOR_CLOSE_STUCK`.
    fn close_doors(&mut self, event: &Event) {
        self.state.mode = MotionMode::DoorClose;
        let dwell = if event.fault == Fault::DoorCloseStuck {
            self.timing.recovery_time
        } else {
            self.timing.time_to_open_close_door
        };
        std::thread::sleep(Duration::from_millis(dwell));
    }

    /// One passenger boards per hall call (the input format carries no explicit
    /// passenger count — see `DESIGN.md`).
    fn load(&mut self, _event: &Event) {
        std::thread::sleep(Duration::from_millis(self.timing.time_to_load_unload_1_passenger));
        self.state.passengers = (self.state.passengers + 1).min(self.capacity);
    }

    fn unload(&mut self, _event: &Event) {
        std::thread::sleep(Duration::from_millis(self.timing.time_to_load_unload_1_passenger));
        self.state.passengers = self.state.passengers.saturating_sub(1);
        self.state.total_served += 1;
    }

    fn emit_completion(&self, event: &Event) {
        self.send(self.telemetry(event, true, Fault::None));
    }

    fn failure_telemetry(&self, event: &Event) -> Event {
        self.telemetry(event, true, Fault::CarStuck)
    }

    fn removal_telemetry(&self, event: &Event) -> Event {
        self.telemetry(event, false, Fault::ArrivalSensor)
    }

    fn telemetry(&self, event: &Event, is_complete: bool, fault: Fault) -> Event {
        Event {
            time: event.time.clone(),
            source: Event::elevator_source(self.state.car_id),
            floor_button: match self.state.mode {
                MotionMode::MovingUp => Some(HallDirection::Up),
                MotionMode::MovingDown => Some(HallDirection::Down),
                _ => None,
            },
            elevator_button: event.elevator_button,
            is_from_floor: false,
            assigned_elevator: self.state.car_id,
            current_floor: self.state.current_floor,
            riders: i32::try_from(self.state.passengers).unwrap_or(i32::MAX),
            is_complete,
            fault,
        }
    }

    fn send(&self, event: Event) {
        if let Err(err) = self.transport.send_event(&event, self.scheduler_addr) {
            self.logger.log(ActivityEvent::TransportError {
                component: format!("car-{}", self.state.car_id),
                details: err.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::net::Ipv4Addr;

    fn test_actor(rx: Receiver<Event>) -> CarActor {
        let config = Config::default();
        let transport = DatagramTransport::bind(
            (Ipv4Addr::LOCALHOST, 0),
            Duration::from_millis(5),
            "car-test",
        )
        .unwrap();
        let scheduler = DatagramTransport::bind(
            (Ipv4Addr::LOCALHOST, 0),
            Duration::from_millis(50),
            "scheduler-test",
        )
        .unwrap();
        let scheduler_addr = scheduler.local_addr().unwrap();
        std::mem::forget(scheduler); // keep the port alive for the duration of the test
        CarActor::new(
            0,
            rx,
            transport,
            scheduler_addr,
            config.timing,
            config.fleet.elevator_capacity,
            ActivityLogger::spawn(None, false).0,
            ShutdownFlag::bare(),
        )
    }

    #[test]
    fn car_stuck_fault_recovers_without_decommissioning() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut actor = test_actor(rx);
        let event = Event::hall_call("t", 3, HallDirection::Up, 5, Fault::CarStuck);
        let terminal = actor.process_assignment(event);
        assert!(!terminal);
        assert!(!actor.state.decommissioned);
    }

    #[test]
    fn arrival_sensor_fault_decommissions_the_car() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut actor = test_actor(rx);
        let event = Event::hall_call("t", 3, HallDirection::Up, 5, Fault::ArrivalSensor);
        let terminal = actor.process_assignment(event);
        assert!(terminal);
        assert!(actor.state.decommissioned);
    }

    #[test]
    fn successful_trip_advances_floor_and_tallies_served() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut actor = test_actor(rx);
        let event = Event::hall_call("t", 1, HallDirection::Up, 4, Fault::None);
        let terminal = actor.process_assignment(event);
        assert!(!terminal);
        assert_eq!(actor.state.current_floor, 4);
        assert_eq!(actor.state.total_served, 1);
        assert_eq!(actor.state.passengers, 0);
    }

    #[test]
    fn door_open_stuck_uses_recovery_dwell() {
        let (_tx, rx) = crossbeam_channel::unbounded();
        let mut actor = test_actor(rx);
        let event = Event::hall_call("t", 1, HallDirection::Up, 2, Fault::DoorOpenStuck);
        let start = std::time::Instant::now();
        actor.open_doors(&event);
        assert!(start.elapsed() >= Duration::from_millis(actor.timing.recovery_time));
        assert_eq!(actor.state.mode, MotionMode::DoorOpen);
    }
}
