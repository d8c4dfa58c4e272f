//! Wires up the scheduler, N car actors (each with its own subsystem task),
//! and the floor injector/receiver pair, then joins everything on shutdown.
//!
//! Thread-orchestration shape mirrors a standard worker-spawn-then-join daemon loop
//! (spawn workers, hold their `JoinHandle`s, join on shutdown) — simplified
//! here because every thread here is uniform and cooperative-shutdown driven
//! rather than panic-respawned, so there is no health-tracking table to keep.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::car::{CarActor, CarSubsystem};
use crate::core::config::Config;
use crate::core::errors::Result;
use crate::core::shutdown::ShutdownFlag;
use crate::fleet::registry::FleetRegistry;
use crate::floor::input::parse_input_file;
use crate::floor::{FloorCounters, FloorInjector, FloorReceiver};
use crate::logger::{ActivityEvent, ActivityLogger};
use crate::scheduler::Scheduler;
use crate::wire::transport::DatagramTransport;

/// Outcome of a completed run, for the CLI to report.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub total_injected: u64,
    pub completed: u64,
}

/// Run the whole dispatcher against `input_file` until every injected hall
/// call completes (or the process receives SIGINT/SIGTERM).
pub fn run_system(config: &Config, input_file: &Path, logger: ActivityLogger, shutdown: ShutdownFlag) -> Result<RunSummary> {
    let events = parse_input_file(input_file)?;
    logger.log(ActivityEvent::RunStarted {
        num_elevators: config.fleet.num_elevators,
        input_file: input_file.display().to_string(),
    });

    let poll = Duration::from_millis(config.timing.poll_interval_ms);
    let scheduler_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.ports.scheduler_ingress));
    let floor_addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.ports.floor_ingress));

    let car_addrs: Vec<SocketAddr> = (0..config.fleet.num_elevators)
        .map(|id| SocketAddr::from((Ipv4Addr::LOCALHOST, config.ports.car_port(id))))
        .collect();

    let mut handles = Vec::new();

    for car_id in 0..config.fleet.num_elevators {
        let subsystem_transport = DatagramTransport::bind(car_addrs[car_id as usize], poll, "car-subsystem")?;
        let actor_transport = subsystem_transport.try_clone()?;
        let (tx, rx) = crossbeam_channel::unbounded();

        let subsystem = CarSubsystem::new(car_id, subsystem_transport, tx, logger.clone(), shutdown.clone());
        let actor = CarActor::new(
            car_id,
            rx,
            actor_transport,
            scheduler_addr,
            config.timing,
            config.fleet.elevator_capacity,
            logger.clone(),
            shutdown.clone(),
        );

        handles.push(subsystem.spawn()?);
        handles.push(actor.spawn()?);
    }

    let scheduler_transport = DatagramTransport::bind(scheduler_addr, poll, "scheduler")?;
    let scheduler = Scheduler::new(
        scheduler_transport,
        FleetRegistry::new(config.fleet.num_elevators),
        car_addrs,
        floor_addr,
        logger.clone(),
        shutdown.clone(),
    );
    handles.push(scheduler.spawn()?);

    let floor_receiver_transport = DatagramTransport::bind(floor_addr, poll, "floor-receiver")?;
    let counters = Arc::new(FloorCounters::default());
    let receiver = FloorReceiver::new(floor_receiver_transport, Arc::clone(&counters), logger.clone(), shutdown.clone());
    handles.push(receiver.spawn()?);

    let injector_transport = DatagramTransport::bind((Ipv4Addr::LOCALHOST, 0), poll, "floor-injector")?;
    let pacing = Duration::from_millis(config.timing.inject_pacing_ms);
    let injector = FloorInjector::new(injector_transport, scheduler_addr, Arc::clone(&counters), logger.clone(), pacing);
    handles.push(injector.spawn(events)?);

    for handle in handles {
        let _ = handle.join();
    }

    Ok(RunSummary {
        total_injected: counters.total_injected(),
        completed: counters.completed(),
    })
}
