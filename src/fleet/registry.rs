//! `FleetRegistry`: single-writer structure the scheduler mutates under one
//! lock. Cars never read or write it directly — they only ever see it
//! through the telemetry they emit.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::fleet::car_state::MotionMode;
use crate::wire::event::{Event, HallDirection};

/// Scheduler's view of one car, refreshed from its telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarRecord {
    pub current_floor: i32,
    pub mode: MotionMode,
    pub passengers: u32,
    pub is_busy: bool,
}

impl CarRecord {
    fn new() -> Self {
        Self {
            current_floor: 1,
            mode: MotionMode::Rest,
            passengers: 0,
            is_busy: false,
        }
    }
}

struct Inner {
    cars: BTreeMap<u32, CarRecord>,
    removed: HashSet<u32>,
}

/// The scheduler's fleet-state registry: one mutex, `O(N)` assignment scans,
/// everything else `O(1)`.
pub struct FleetRegistry {
    inner: Mutex<Inner>,
    num_cars: u32,
    round_robin_cursor: AtomicU32,
}

impl FleetRegistry {
    /// Seed `num_cars` cars at floor 1, idle, none removed.
    #[must_use]
    pub fn new(num_cars: u32) -> Self {
        let cars = (0..num_cars).map(|id| (id, CarRecord::new())).collect();
        Self {
            inner: Mutex::new(Inner {
                cars,
                removed: HashSet::new(),
            }),
            num_cars,
            round_robin_cursor: AtomicU32::new(0),
        }
    }

    /// Snapshot of all live (non-removed) car records, for diagnostics and tests.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<u32, CarRecord> {
        self.inner.lock().cars.clone()
    }

    /// Ids permanently decommissioned via an `ARRIVAL_SENSOR` fault.
    #[must_use]
    pub fn removed_ids(&self) -> HashSet<u32> {
        self.inner.lock().removed.clone()
    }

    #[must_use]
    pub fn is_removed(&self, car_id: u32) -> bool {
        self.inner.lock().removed.contains(&car_id)
    }

    /// Apply a car's telemetry to the registry.
    pub fn update_from_telemetry(&self, event: &Event) {
        let car_id = event.assigned_elevator;
        let mut guard = self.inner.lock();
        let Some(record) = guard.cars.get_mut(&car_id) else {
            return;
        };

        record.current_floor = event.current_floor;
        if event.riders >= 0 {
            record.passengers = event.riders as u32;
        }

        match event.floor_button {
            Some(HallDirection::Up) => record.mode = MotionMode::MovingUp,
            Some(HallDirection::Down) => record.mode = MotionMode::MovingDown,
            None if Event::source_looks_like_elevator(&event.source) => {
                record.mode = MotionMode::Rest;
            }
            None => {}
        }

        if event.is_complete {
            record.is_busy = false;
        }
    }

    pub fn mark_busy(&self, car_id: u32) {
        if let Some(record) = self.inner.lock().cars.get_mut(&car_id) {
            record.is_busy = true;
        }
    }

    pub fn mark_idle(&self, car_id: u32) {
        if let Some(record) = self.inner.lock().cars.get_mut(&car_id) {
            record.is_busy = false;
        }
    }

    /// Decommission a car: erased from the assignable map *and* added to the
    /// removed set in the same locked section, so assignment can never race a
    /// partially-removed car.
    pub fn remove(&self, car_id: u32) {
        let mut guard = self.inner.lock();
        guard.cars.remove(&car_id);
        guard.removed.insert(car_id);
    }

    /// Per-candidate score for the given hall call; lower is better. A free
    /// function so assignment scenarios can be unit-tested without a
    /// registry instance.
    #[must_use]
    pub fn score(record: &CarRecord, origin_floor: i32, is_going_up: bool) -> i64 {
        let mut score: i64 = 1000;

        if record.is_busy {
            score += 5000;
        }

        let distance = (record.current_floor - origin_floor).unsigned_abs();
        score += i64::from(distance) * 10;

        let going_up = record.mode == MotionMode::MovingUp;
        let going_down = record.mode == MotionMode::MovingDown;
        let at_rest = record.mode.is_at_rest();

        if is_going_up {
            if going_up && record.current_floor <= origin_floor {
                score -= 500;
            } else if at_rest {
                score -= 300;
            }
        } else if going_down && record.current_floor >= origin_floor {
            score -= 500;
        } else if record.current_floor > origin_floor {
            score -= 400;
        } else if at_rest {
            score -= 300;
        }

        score
    }

    /// Select the best car for `request` and mark it busy, under one lock.
    /// Returns the chosen car id.
    pub fn assign(&self, request: &Event) -> u32 {
        let origin_floor = request.current_floor;
        let is_going_up = matches!(request.floor_button, Some(HallDirection::Up));

        let mut guard = self.inner.lock();
        let mut best: Option<(u32, i64)> = None;
        for car_id in 0..self.num_cars {
            if guard.removed.contains(&car_id) {
                continue;
            }
            let Some(record) = guard.cars.get(&car_id) else {
                continue;
            };
            let candidate_score = Self::score(record, origin_floor, is_going_up);
            match best {
                Some((_, best_score)) if candidate_score >= best_score => {}
                _ => best = Some((car_id, candidate_score)),
            }
        }

        let chosen = best.map_or_else(
            || {
                // All candidates removed: fall back to round-robin over the
                // configured fleet size.
                let next = self.round_robin_cursor.fetch_add(1, Ordering::Relaxed);
                next % self.num_cars.max(1)
            },
            |(id, _)| id,
        );

        if let Some(record) = guard.cars.get_mut(&chosen) {
            record.is_busy = true;
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::event::Fault;

    fn idle_record_at(floor: i32) -> CarRecord {
        CarRecord {
            current_floor: floor,
            mode: MotionMode::Rest,
            passengers: 0,
            is_busy: false,
        }
    }

    #[test]
    fn tiebreak_prefers_lowest_id_among_equal_scores() {
        // 4 idle cars at floor 1, hall call at floor 1 UP: all score equal.
        let registry = FleetRegistry::new(4);
        let request = Event::hall_call("t", 1, HallDirection::Up, 2, Fault::None);
        let chosen = registry.assign(&request);
        assert_eq!(chosen, 0);
        assert!(registry.snapshot()[&0].is_busy);
    }

    #[test]
    fn directional_preference_favors_idle_over_busy_moving_up() {
        // Car 0 at floor 5 moving up & busy; car 1 idle at floor 1.
        // Hall call at floor 3 UP should prefer the idle car.
        let registry = FleetRegistry::new(2);
        {
            let mut guard = registry.inner.lock();
            guard.cars.get_mut(&0).unwrap().current_floor = 5;
            guard.cars.get_mut(&0).unwrap().mode = MotionMode::MovingUp;
            guard.cars.get_mut(&0).unwrap().is_busy = true;
        }
        let request = Event::hall_call("t", 3, HallDirection::Up, 5, Fault::None);
        let chosen = registry.assign(&request);
        assert_eq!(chosen, 1);
    }

    #[test]
    fn score_prefers_idle_car_over_busy_moving_car() {
        let moving_up_busy = CarRecord {
            current_floor: 5,
            mode: MotionMode::MovingUp,
            passengers: 0,
            is_busy: true,
        };
        let idle = idle_record_at(1);
        assert_eq!(FleetRegistry::score(&moving_up_busy, 3, true), 6020);
        assert_eq!(FleetRegistry::score(&idle, 3, true), 720);
    }

    #[test]
    fn removed_car_is_never_selected() {
        let registry = FleetRegistry::new(2);
        registry.remove(0);
        let request = Event::hall_call("t", 1, HallDirection::Up, 2, Fault::None);
        let chosen = registry.assign(&request);
        assert_eq!(chosen, 1);
        assert!(!registry.snapshot().contains_key(&0));
        assert!(registry.removed_ids().contains(&0));
    }

    #[test]
    fn all_removed_falls_back_to_round_robin() {
        let registry = FleetRegistry::new(2);
        registry.remove(0);
        registry.remove(1);
        let request = Event::hall_call("t", 1, HallDirection::Up, 2, Fault::None);
        let first = registry.assign(&request);
        let second = registry.assign(&request);
        assert_ne!(first, second);
    }

    #[test]
    fn telemetry_updates_floor_passengers_mode_and_busy() {
        let registry = FleetRegistry::new(1);
        registry.mark_busy(0);
        let telemetry = Event {
            time: "t".into(),
            source: Event::elevator_source(0),
            floor_button: None,
            elevator_button: 4,
            is_from_floor: false,
            assigned_elevator: 0,
            current_floor: 4,
            riders: 2,
            is_complete: true,
            fault: Fault::None,
        };
        registry.update_from_telemetry(&telemetry);
        let snap = registry.snapshot();
        assert_eq!(snap[&0].current_floor, 4);
        assert_eq!(snap[&0].passengers, 2);
        assert_eq!(snap[&0].mode, MotionMode::Rest);
        assert!(!snap[&0].is_busy);
    }

    #[test]
    fn negative_riders_does_not_overwrite_passenger_count() {
        let registry = FleetRegistry::new(1);
        let telemetry = Event {
            source: Event::elevator_source(0),
            assigned_elevator: 0,
            current_floor: 2,
            riders: -1,
            ..Event::default()
        };
        registry.update_from_telemetry(&telemetry);
        assert_eq!(registry.snapshot()[&0].passengers, 0);
    }
}
