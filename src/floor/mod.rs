//! Floor injector and its completion receiver. Two tasks sharing one
//! counter pair, the same shape as the car actor/subsystem split: the
//! injector only ever sends, the receiver only ever receives, so neither
//! blocks the other.

pub mod input;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::errors::{LiftError, Result};
use crate::core::shutdown::ShutdownFlag;
use crate::logger::{ActivityEvent, ActivityLogger};
use crate::wire::event::Event;
use crate::wire::transport::DatagramTransport;

/// Counters shared between the injector and the receiver.
#[derive(Default)]
pub struct FloorCounters {
    total_injected: AtomicU64,
    completed: AtomicU64,
}

impl FloorCounters {
    #[must_use]
    pub fn total_injected(&self) -> u64 {
        self.total_injected.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        let total = self.total_injected();
        total > 0 && self.completed() >= total
    }
}

/// Sends every scripted hall call to the scheduler, paced by `pacing`.
pub struct FloorInjector {
    transport: DatagramTransport,
    scheduler_addr: SocketAddr,
    counters: Arc<FloorCounters>,
    logger: ActivityLogger,
    pacing: Duration,
}

impl FloorInjector {
    #[must_use]
    pub fn new(
        transport: DatagramTransport,
        scheduler_addr: SocketAddr,
        counters: Arc<FloorCounters>,
        logger: ActivityLogger,
        pacing: Duration,
    ) -> Self {
        Self {
            transport,
            scheduler_addr,
            counters,
            logger,
            pacing,
        }
    }

    /// Spawn the injection thread for the already-parsed `events`.
    pub fn spawn(self, events: Vec<Event>) -> Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("liftsim-floor-injector".into())
            .spawn(move || self.run(events))
            .map_err(|source| LiftError::Runtime {
                details: format!("failed to spawn floor injector thread: {source}"),
            })
    }

    fn run(self, events: Vec<Event>) {
        self.counters
            .total_injected
            .store(events.len() as u64, Ordering::Relaxed);

        for event in events {
            if let Some(direction) = event.floor_button {
                self.logger.log(ActivityEvent::HallCallInjected {
                    origin_floor: event.current_floor,
                    direction,
                    fault: event.fault,
                });
            }
            if let Err(err) = self.transport.send_event(&event, self.scheduler_addr) {
                self.logger.log(ActivityEvent::TransportError {
                    component: "floor-injector".into(),
                    details: err.to_string(),
                });
            }
            std::thread::sleep(self.pacing);
        }
    }
}

/// Receives telemetry relayed from the scheduler and tallies completions.
/// Sets the shared shutdown flag once every injected request has completed,
/// so the run drains and joins instead of exiting the process abruptly.
pub struct FloorReceiver {
    transport: DatagramTransport,
    counters: Arc<FloorCounters>,
    logger: ActivityLogger,
    shutdown: ShutdownFlag,
}

impl FloorReceiver {
    #[must_use]
    pub fn new(
        transport: DatagramTransport,
        counters: Arc<FloorCounters>,
        logger: ActivityLogger,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            transport,
            counters,
            logger,
            shutdown,
        }
    }

    pub fn spawn(self) -> Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("liftsim-floor-receiver".into())
            .spawn(move || self.run())
            .map_err(|source| LiftError::Runtime {
                details: format!("failed to spawn floor receiver thread: {source}"),
            })
    }

    fn run(self) {
        loop {
            if self.shutdown.is_set() {
                break;
            }
            match self.transport.recv_event() {
                Ok(Some(event)) => {
                    if event.is_complete {
                        self.counters.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    if self.counters.is_done() {
                        self.logger.log(ActivityEvent::RunComplete {
                            total_injected: self.counters.total_injected(),
                            completed: self.counters.completed(),
                        });
                        self.shutdown.set();
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    self.logger.log(ActivityEvent::TransportError {
                        component: "floor-receiver".into(),
                        details: err.to_string(),
                    });
                }
            }
        }
    }
}
