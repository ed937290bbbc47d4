//! Navigation target tracking.
//!
//! Owns the ordered target list and the active-target index, and decides
//! when the vehicle has reached its active target. Reaching a target
//! advances to the next one, wrapping from the last back to the first
//! (closed-loop patrol).

use serde::{Deserialize, Serialize};

use crate::geo::{self, GeoPoint};

/// Distance below which the vehicle is considered to have arrived.
pub const REACHED_THRESHOLD_M: f64 = 1.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Target {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, name: None }
    }

    pub fn named(lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self { lat, lon, name: Some(name.into()) }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Emitted when a position update changes the tracker state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReachedEvent {
    /// Index of the target that was reached.
    pub reached: usize,
    /// Index now active.
    pub next: usize,
}

/// Ordered target list plus active index.
///
/// Invariant: `active`, when set, is a valid index into `targets`, and it
/// keeps pointing at the same logical target across removals and reorders
/// of other entries.
#[derive(Default)]
pub struct NavTracker {
    targets: Vec<Target>,
    active: Option<usize>,
}

impl NavTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_target(&self) -> Option<&Target> {
        self.active.and_then(|i| self.targets.get(i))
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Append a target. The first target added while idle becomes active.
    pub fn add(&mut self, target: Target) {
        self.targets.push(target);
        if self.active.is_none() {
            self.active = Some(self.targets.len() - 1);
        }
    }

    /// Remove the target at `index`. Removing the active target drops back
    /// to the next entry (or idle if the list empties); removing an earlier
    /// entry shifts the active index so it still names the same target.
    pub fn remove(&mut self, index: usize) {
        if index >= self.targets.len() {
            return;
        }
        self.targets.remove(index);
        self.active = match self.active {
            Some(_) if self.targets.is_empty() => None,
            Some(a) if index < a => Some(a - 1),
            Some(a) if index == a => Some(a.min(self.targets.len() - 1)),
            other => other,
        };
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.active = None;
    }

    /// Explicitly select a target. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) {
        if index < self.targets.len() {
            self.active = Some(index);
        }
    }

    /// Swap the target at `index` with the one above it, keeping the
    /// active marker on the same logical target.
    pub fn move_up(&mut self, index: usize) {
        if index == 0 || index >= self.targets.len() {
            return;
        }
        self.targets.swap(index - 1, index);
        self.active = self.active.map(|a| match a {
            a if a == index => index - 1,
            a if a == index - 1 => index,
            a => a,
        });
    }

    pub fn move_down(&mut self, index: usize) {
        if index + 1 >= self.targets.len() {
            return;
        }
        self.targets.swap(index, index + 1);
        self.active = self.active.map(|a| match a {
            a if a == index => index + 1,
            a if a == index + 1 => index,
            a => a,
        });
    }

    /// Update the coordinates of an existing target in place.
    pub fn set_coords(&mut self, index: usize, lat: f64, lon: f64) {
        if let Some(t) = self.targets.get_mut(index) {
            t.lat = lat;
            t.lon = lon;
        }
    }

    /// Replace the whole list (file import). The first entry becomes
    /// active, matching the import flow of the host application.
    pub fn replace_all(&mut self, targets: Vec<Target>) {
        self.targets = targets;
        self.active = if self.targets.is_empty() { None } else { Some(0) };
    }

    /// Ingest a vehicle position. When navigating and within
    /// `REACHED_THRESHOLD_M` of the active target, advance to the next
    /// target modulo the list length.
    pub fn update_position(&mut self, pos: GeoPoint) -> Option<ReachedEvent> {
        let active = self.active?;
        let target = self.targets.get(active)?;
        let dist = geo::distance_m(pos, target.position());
        if dist > REACHED_THRESHOLD_M {
            return None;
        }
        let next = (active + 1) % self.targets.len();
        log::info!(
            "target {} reached ({dist:.2} m), advancing to target {}",
            active + 1,
            next + 1
        );
        self.active = Some(next);
        Some(ReachedEvent { reached: active, next })
    }
}
