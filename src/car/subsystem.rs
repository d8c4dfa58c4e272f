//! `CarSubsystem`: owns the car's ingress socket and forwards assignments to
//! its [`super::actor::CarActor`] over a channel. Kept separate from the
//! actor so the actor's state machine never blocks on socket I/O and the
//! subsystem never touches car state directly — two tasks sharing a channel
//! rather than parent/child coupling between a socket and a state machine.

use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::core::errors::{LiftError, Result};
use crate::core::shutdown::ShutdownFlag;
use crate::logger::{ActivityEvent, ActivityLogger};
use crate::wire::event::Event;
use crate::wire::transport::DatagramTransport;

/// The receive-loop half of a car: polls its UDP port, forwards each
/// assignment to the paired actor.
pub struct CarSubsystem {
    car_id: u32,
    transport: DatagramTransport,
    tx: Sender<Event>,
    logger: ActivityLogger,
    shutdown: ShutdownFlag,
}

impl CarSubsystem {
    #[must_use]
    pub fn new(
        car_id: u32,
        transport: DatagramTransport,
        tx: Sender<Event>,
        logger: ActivityLogger,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            car_id,
            transport,
            tx,
            logger,
            shutdown,
        }
    }

    pub fn spawn(self) -> Result<JoinHandle<()>> {
        let name = format!("liftsim-car-subsystem-{}", self.car_id);
        std::thread::Builder::new()
            .name(name)
            .spawn(move || self.run())
            .map_err(|source| LiftError::Runtime {
                details: format!("failed to spawn car subsystem thread: {source}"),
            })
    }

    fn run(self) {
        loop {
            if self.shutdown.is_set() {
                break;
            }
            match self.transport.recv_event() {
                Ok(Some(event)) => {
                    if self.tx.send(event).is_err() {
                        break; // actor thread is gone
                    }
                }
                Ok(None) => {
                    // read timeout; loop back and re-check shutdown
                }
                Err(err) => {
                    self.logger.log(ActivityEvent::TransportError {
                        component: format!("car-subsystem-{}", self.car_id),
                        details: err.to_string(),
                    });
                }
            }
        }
    }
}
