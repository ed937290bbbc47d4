//! Telemetry bus ingestion.
//!
//! The host ground-control bus publishes MAVLink GLOBAL_POSITION_INT
//! fields as scaled integers; samples arrive here over an mpsc channel and
//! are decoded into the live vehicle state. Feeding the channel is the
//! bridge's job (or the demo feed's); this module never blocks on it.

use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};

use crate::geo::GeoPoint;
use crate::trail::{GridAnchor, Trail};

/// Telemetry variables the map consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKey {
    /// `GLOBAL_POSITION_INT/lat`, degrees * 1e7.
    Latitude,
    /// `GLOBAL_POSITION_INT/lon`, degrees * 1e7.
    Longitude,
    /// `GLOBAL_POSITION_INT/hdg`, centidegrees.
    Heading,
}

impl VarKey {
    pub fn bus_name(&self) -> &'static str {
        match self {
            VarKey::Latitude => "GLOBAL_POSITION_INT/lat",
            VarKey::Longitude => "GLOBAL_POSITION_INT/lon",
            VarKey::Heading => "GLOBAL_POSITION_INT/hdg",
        }
    }

    /// Divisor converting the raw bus value to degrees.
    pub fn scale(&self) -> f64 {
        match self {
            VarKey::Latitude | VarKey::Longitude => 1e7,
            VarKey::Heading => 100.0,
        }
    }
}

/// One raw sample as published on the bus (pre-scaling).
#[derive(Clone, Copy, Debug)]
pub struct TelemetrySample {
    pub key: VarKey,
    pub value: f64,
}

pub fn channel() -> (Sender<TelemetrySample>, Receiver<TelemetrySample>) {
    mpsc::channel()
}

/// Live vehicle state assembled from telemetry samples.
///
/// Position stays `None` until both latitude and longitude have been seen
/// at least once; everything downstream (projection, proximity checks)
/// skips its work until then.
pub struct VehicleState {
    lat: Option<f64>,
    lon: Option<f64>,
    pub heading_deg: f64,
    pub first_fix: Option<GeoPoint>,
    pub last_fix_at: Option<DateTime<Utc>>,
    pub trail: Trail,
    pub grid: GridAnchor,
    last_position: Option<GeoPoint>,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            lat: None,
            lon: None,
            heading_deg: 0.0,
            first_fix: None,
            last_fix_at: None,
            trail: Trail::new(),
            grid: GridAnchor::new(),
            last_position: None,
        }
    }
}

impl VehicleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Option<GeoPoint> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }

    /// Decode and apply one sample. Returns the updated position when the
    /// sample completed a position fix (the caller runs target proximity
    /// checks off that).
    pub fn ingest(&mut self, sample: TelemetrySample) -> Option<GeoPoint> {
        let value = sample.value / sample.key.scale();
        match sample.key {
            VarKey::Heading => {
                self.heading_deg = value.rem_euclid(360.0);
                None
            }
            VarKey::Latitude => {
                self.lat = Some(value);
                self.apply_position_fix()
            }
            VarKey::Longitude => {
                self.lon = Some(value);
                self.apply_position_fix()
            }
        }
    }

    fn apply_position_fix(&mut self) -> Option<GeoPoint> {
        let pos = self.position()?;
        if self.first_fix.is_none() {
            self.first_fix = Some(pos);
        }
        self.grid.ingest(pos);
        self.trail.push(pos);
        self.last_fix_at = Some(Utc::now());
        self.last_position = Some(pos);
        Some(pos)
    }
}
