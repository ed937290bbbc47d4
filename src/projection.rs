//! Camera state and geodetic-to-screen projection.
//!
//! Maps geodetic positions to canvas pixels given the current reference
//! position (the vehicle), zoom scale, pan offset and view mode. All
//! functions are pure; the map renderer feeds them the live state.

use nalgebra::{Rotation2, Vector2};

use crate::geo::{self, GeoPoint};

/// Pixels per meter at scale 1.
pub const BASE_SCALE: f64 = 20.0;

pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 20.0;

/// Zoom factor applied per wheel step.
pub const ZOOM_STEP: f64 = 1.1;

/// Candidate grid line spacings in meters.
const GRID_STEPS_M: [f64; 13] = [
    1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
];

/// Minimum on-screen spacing between grid lines.
const MIN_GRID_SPACING_PX: f64 = 60.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Scene rotated so the vehicle's heading points up.
    TrackUp,
    /// True north fixed up; the vehicle glyph rotates instead.
    NorthUp,
}

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    scale: f64,
    /// Pan offset in meters, screen convention.
    pub pan_m: Vector2<f64>,
    pub mode: ViewMode,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan_m: Vector2::new(0.0, 0.0),
            mode: ViewMode::TrackUp,
        }
    }
}

impl Camera {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn zoom_in(&mut self) {
        self.set_scale(self.scale * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_scale(self.scale / ZOOM_STEP);
    }

    /// Combined meters-to-pixels multiplier at the current zoom.
    pub fn px_per_meter(&self) -> f64 {
        BASE_SCALE * self.scale
    }

    /// Shift the pan offset by a drag measured in screen pixels.
    pub fn pan_by_px(&mut self, dx: f64, dy: f64) {
        self.pan_m += Vector2::new(dx, dy) / self.px_per_meter();
    }

    pub fn reset_pan(&mut self) {
        self.pan_m = Vector2::new(0.0, 0.0);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ViewMode::TrackUp => ViewMode::NorthUp,
            ViewMode::NorthUp => ViewMode::TrackUp,
        };
    }
}

/// Center of the scene on screen: canvas center plus the scaled pan offset.
/// The vehicle glyph sits here, and track-up rotation pivots around it.
pub fn scene_center(camera: &Camera, canvas: Vector2<f64>) -> Vector2<f64> {
    canvas / 2.0 + camera.pan_m * camera.px_per_meter()
}

/// Project world coordinates (meters relative to the reference) to screen
/// pixels, without any scene rotation.
pub fn world_to_screen(world_m: Vector2<f64>, camera: &Camera, canvas: Vector2<f64>) -> Vector2<f64> {
    scene_center(camera, canvas) + world_m * camera.px_per_meter()
}

/// Project a geodetic point to screen pixels relative to `reference`.
///
/// `heading_deg` only matters in track-up mode, where the whole scene is
/// rotated about the scene center by the negated heading so the vehicle's
/// forward direction points up.
pub fn project(
    point: GeoPoint,
    reference: GeoPoint,
    camera: &Camera,
    canvas: Vector2<f64>,
    heading_deg: f64,
) -> Vector2<f64> {
    let screen = world_to_screen(geo::local_offset_m(point, reference), camera, canvas);
    rotate_for_view(screen, camera, canvas, heading_deg)
}

/// Apply the view-mode scene rotation to an already-projected screen point.
pub fn rotate_for_view(
    screen: Vector2<f64>,
    camera: &Camera,
    canvas: Vector2<f64>,
    heading_deg: f64,
) -> Vector2<f64> {
    match camera.mode {
        ViewMode::NorthUp => screen,
        ViewMode::TrackUp => {
            let pivot = scene_center(camera, canvas);
            let rot = Rotation2::new(-heading_deg.to_radians());
            pivot + rot * (screen - pivot)
        }
    }
}

/// Smallest grid spacing whose on-screen length stays readable at the
/// current zoom; falls back to the coarsest step when zoomed far out.
pub fn grid_spacing_m(camera: &Camera) -> f64 {
    let px_per_m = camera.px_per_meter();
    for step in GRID_STEPS_M {
        if step * px_per_m >= MIN_GRID_SPACING_PX {
            return step;
        }
    }
    GRID_STEPS_M[GRID_STEPS_M.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    fn canvas() -> Vector2<f64> {
        Vector2::new(800.0, 600.0)
    }

    #[test]
    fn reference_projects_to_canvas_center() {
        let camera = Camera::default();
        let p = pt(63.43, 10.39);
        let s = project(p, p, &camera, canvas(), 123.0);
        assert!((s.x - 400.0).abs() < 1e-9);
        assert!((s.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn hundred_meters_north_is_two_thousand_px_up() {
        let mut camera = Camera::default();
        camera.mode = ViewMode::NorthUp;
        let reference = pt(10.0, 20.0);
        let point = pt(10.0009, 20.0); // ~100 m north
        let s = project(point, reference, &camera, canvas(), 0.0);
        assert!((s.x - 400.0).abs() < 1e-6);
        let dy = s.y - 300.0;
        assert!((dy + 2003.76).abs() < 1.0, "got dy {dy}");
    }

    #[test]
    fn scale_is_clamped() {
        let mut camera = Camera::default();
        camera.set_scale(1000.0);
        assert_eq!(camera.scale(), MAX_SCALE);
        camera.set_scale(0.0);
        assert_eq!(camera.scale(), MIN_SCALE);
        for _ in 0..100 {
            camera.zoom_out();
        }
        assert_eq!(camera.scale(), MIN_SCALE);
    }

    #[test]
    fn pan_shifts_scene_center() {
        let mut camera = Camera::default();
        camera.mode = ViewMode::NorthUp;
        camera.pan_by_px(50.0, -30.0);
        let p = pt(10.0, 20.0);
        let s = project(p, p, &camera, canvas(), 0.0);
        assert!((s.x - 450.0).abs() < 1e-9);
        assert!((s.y - 270.0).abs() < 1e-9);
    }

    #[test]
    fn pan_is_anchored_to_world_under_zoom() {
        let mut camera = Camera::default();
        camera.pan_by_px(40.0, 0.0);
        let pan_m = camera.pan_m.x;
        camera.set_scale(2.0);
        // the same world pan now covers twice the pixels
        let center = scene_center(&camera, canvas());
        assert!((center.x - (400.0 + pan_m * camera.px_per_meter())).abs() < 1e-9);
    }

    #[test]
    fn track_up_rotates_scene_about_vehicle() {
        let mut camera = Camera::default();
        camera.mode = ViewMode::TrackUp;
        let reference = pt(10.0, 20.0);
        let north = pt(10.0009, 20.0);
        // heading east: a point due north must appear to the vehicle's left
        let s = project(north, reference, &camera, canvas(), 90.0);
        assert!(s.x < 400.0 - 1000.0, "x {}", s.x);
        assert!((s.y - 300.0).abs() < 1e-6, "y {}", s.y);
    }

    #[test]
    fn north_up_applies_no_scene_rotation() {
        let mut camera = Camera::default();
        camera.mode = ViewMode::NorthUp;
        let reference = pt(10.0, 20.0);
        let north = pt(10.0009, 20.0);
        let a = project(north, reference, &camera, canvas(), 0.0);
        let b = project(north, reference, &camera, canvas(), 90.0);
        assert_eq!(a, b);
    }

    #[test]
    fn grid_spacing_tracks_zoom() {
        let mut camera = Camera::default();
        // scale 1: 20 px/m, first step with >= 60 px is 5 m
        assert_eq!(grid_spacing_m(&camera), 5.0);
        camera.set_scale(MIN_SCALE);
        // 2 px/m: needs 50 m lines
        assert_eq!(grid_spacing_m(&camera), 50.0);
        camera.set_scale(MAX_SCALE);
        // 400 px/m: 1 m lines are already 400 px apart
        assert_eq!(grid_spacing_m(&camera), 1.0);
    }
}
