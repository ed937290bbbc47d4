//! Demo telemetry feed.
//!
//! Drives a synthetic ROV along a lawnmower survey pattern and publishes
//! the same raw scaled-integer samples a real bus bridge would, so the
//! whole ingest path is exercised without a vehicle.

use std::sync::mpsc::Sender;

use crate::geo::{GeoPoint, METERS_PER_DEGREE};
use crate::telemetry::{TelemetrySample, VarKey};

/// East-west leg length in meters.
const LEG_LENGTH_M: f64 = 60.0;
/// Northward step between legs.
const STEP_LENGTH_M: f64 = 10.0;
/// Cruise speed in m/s.
const SPEED_MPS: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    East,
    StepAfterEast,
    West,
    StepAfterWest,
}

pub struct SimFeed {
    pos: GeoPoint,
    phase: Phase,
    traveled_m: f64,
}

impl SimFeed {
    pub fn new(start: GeoPoint) -> Self {
        Self { pos: start, phase: Phase::East, traveled_m: 0.0 }
    }

    pub fn position(&self) -> GeoPoint {
        self.pos
    }

    pub fn heading_deg(&self) -> f64 {
        match self.phase {
            Phase::East => 90.0,
            Phase::West => 270.0,
            Phase::StepAfterEast | Phase::StepAfterWest => 0.0,
        }
    }

    /// Advance the simulation by `dt` seconds and publish lat/lon/hdg
    /// samples in raw bus units.
    pub fn tick(&mut self, dt: f64, tx: &Sender<TelemetrySample>) {
        self.advance(SPEED_MPS * dt);

        let samples = [
            TelemetrySample { key: VarKey::Latitude, value: (self.pos.lat * 1e7).round() },
            TelemetrySample { key: VarKey::Longitude, value: (self.pos.lon * 1e7).round() },
            TelemetrySample { key: VarKey::Heading, value: (self.heading_deg() * 100.0).round() },
        ];
        for sample in samples {
            let _ = tx.send(sample);
        }
    }

    fn advance(&mut self, mut dist_m: f64) {
        while dist_m > 0.0 {
            let leg_len = match self.phase {
                Phase::East | Phase::West => LEG_LENGTH_M,
                Phase::StepAfterEast | Phase::StepAfterWest => STEP_LENGTH_M,
            };
            let remaining = leg_len - self.traveled_m;
            let step = dist_m.min(remaining);
            self.move_along_heading(step);
            self.traveled_m += step;
            dist_m -= step;

            if self.traveled_m >= leg_len {
                self.traveled_m = 0.0;
                self.phase = match self.phase {
                    Phase::East => Phase::StepAfterEast,
                    Phase::StepAfterEast => Phase::West,
                    Phase::West => Phase::StepAfterWest,
                    Phase::StepAfterWest => Phase::East,
                };
            }
        }
    }

    fn move_along_heading(&mut self, dist_m: f64) {
        let heading = self.heading_deg().to_radians();
        let north_m = dist_m * heading.cos();
        let east_m = dist_m * heading.sin();
        self.pos.lat += north_m / METERS_PER_DEGREE;
        self.pos.lon += east_m / (METERS_PER_DEGREE * self.pos.lat.to_radians().cos());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{self, VehicleState};

    #[test]
    fn feed_moves_east_first() {
        let (tx, rx) = telemetry::channel();
        let mut sim = SimFeed::new(GeoPoint::new(63.43, 10.39));
        sim.tick(1.0, &tx);

        let mut state = VehicleState::new();
        while let Ok(sample) = rx.try_recv() {
            state.ingest(sample);
        }
        let pos = state.position().unwrap();
        assert!(pos.lon > 10.39);
        assert!((pos.lat - 63.43).abs() < 1e-9);
        assert_eq!(state.heading_deg, 90.0);
    }

    #[test]
    fn feed_turns_north_at_leg_end() {
        let (tx, _rx) = telemetry::channel();
        let mut sim = SimFeed::new(GeoPoint::new(63.43, 10.39));
        // 60 m leg at 2 m/s: turn after 30 s
        sim.tick(31.0, &tx);
        assert_eq!(sim.heading_deg(), 0.0);
    }

    #[test]
    fn pattern_stays_inside_the_leg_envelope() {
        let (tx, _rx) = telemetry::channel();
        let start = GeoPoint::new(63.43, 10.39);
        let mut sim = SimFeed::new(start);
        for _ in 0..500 {
            sim.tick(1.0, &tx);
            let east_m = crate::geo::local_offset_m(sim.position(), start).x;
            assert!((-1.0..=LEG_LENGTH_M + 1.0).contains(&east_m), "east {east_m}");
        }
    }
}
