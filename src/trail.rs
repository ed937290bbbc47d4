//! Position history and the scrolling grid anchor.

use std::collections::VecDeque;

use nalgebra::Vector2;

use crate::geo::{self, GeoPoint};

/// Trail capacity; oldest points are evicted once exceeded.
pub const MAX_TRAIL_POINTS: usize = 100;

/// Minimum travel in meters before a new trail point is recorded.
/// Suppresses redundant points while the vehicle sits still.
pub const MIN_DISTANCE_M: f64 = 0.5;

/// Bounded history of recently visited positions, rendered as a path.
#[derive(Default)]
pub struct Trail {
    points: VecDeque<GeoPoint>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position sample. The first sample is always kept; later
    /// samples are kept only once the vehicle has moved `MIN_DISTANCE_M`
    /// from the last recorded point. Returns whether a point was recorded.
    pub fn push(&mut self, pos: GeoPoint) -> bool {
        if let Some(&last) = self.points.back() {
            if geo::distance_m(pos, last) < MIN_DISTANCE_M {
                return false;
            }
        }
        self.points.push_back(pos);
        while self.points.len() > MAX_TRAIL_POINTS {
            self.points.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoPoint> {
        self.points.iter()
    }
}

/// Accumulates total vehicle displacement in meters since the first fix.
///
/// The background grid is anchored to the world, not to the vehicle: as the
/// vehicle (and with it the projection reference) moves, the grid lines are
/// shifted by the accumulated offset so they appear to stay put.
#[derive(Default)]
pub struct GridAnchor {
    origin: Option<GeoPoint>,
    offset: Vector2<f64>,
    last: Option<GeoPoint>,
}

impl GridAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, pos: GeoPoint) {
        if self.origin.is_none() {
            self.origin = Some(pos);
        }
        if let Some(last) = self.last {
            self.offset += geo::local_offset_m(pos, last);
        }
        self.last = Some(pos);
    }

    pub fn origin(&self) -> Option<GeoPoint> {
        self.origin
    }

    /// Total displacement in meters since the first fix (screen convention).
    pub fn offset(&self) -> Vector2<f64> {
        self.offset
    }

    /// Per-axis grid phase for a given line spacing in meters.
    pub fn offset_mod(&self, spacing_m: f64) -> Vector2<f64> {
        Vector2::new(self.offset.x % spacing_m, self.offset.y % spacing_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn first_sample_always_recorded() {
        let mut trail = Trail::new();
        assert!(trail.push(pt(10.0, 20.0)));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn stationary_samples_are_suppressed() {
        let mut trail = Trail::new();
        trail.push(pt(10.0, 20.0));
        // ~0.1 m north, below the 0.5 m threshold
        assert!(!trail.push(pt(10.000001, 20.0)));
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn moving_samples_are_recorded() {
        let mut trail = Trail::new();
        trail.push(pt(10.0, 20.0));
        // ~1.1 m north
        assert!(trail.push(pt(10.00001, 20.0)));
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn trail_never_exceeds_bound() {
        let mut trail = Trail::new();
        for i in 0..3 * MAX_TRAIL_POINTS {
            // each step ~1.1 m north
            trail.push(pt(10.0 + i as f64 * 1e-5, 20.0));
        }
        assert_eq!(trail.len(), MAX_TRAIL_POINTS);
        // the oldest points were the ones evicted
        let first = *trail.iter().next().unwrap();
        assert!(first.lat > 10.0);
    }

    #[test]
    fn grid_anchor_accumulates_movement() {
        let mut anchor = GridAnchor::new();
        anchor.ingest(pt(10.0, 20.0));
        assert_eq!(anchor.offset(), Vector2::new(0.0, 0.0));
        anchor.ingest(pt(10.0009, 20.0)); // ~100 m north
        let off = anchor.offset();
        assert!(off.x.abs() < 1e-9);
        assert!((off.y + 100.188).abs() < 0.01);
        assert_eq!(anchor.origin(), Some(pt(10.0, 20.0)));
    }

    #[test]
    fn grid_phase_wraps_at_spacing() {
        let mut anchor = GridAnchor::new();
        anchor.ingest(pt(0.0, 20.0));
        anchor.ingest(pt(0.0, 20.001)); // ~111.32 m east
        let phase = anchor.offset_mod(50.0);
        assert!(phase.x > 11.0 && phase.x < 12.0, "got {}", phase.x);
    }
}
