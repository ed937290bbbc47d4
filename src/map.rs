//! Map canvas rendering.
//!
//! Draws the grid, trail, targets, guide lines, vehicle glyph, north
//! indicator and scale readout with the egui painter, and handles pan,
//! zoom and touch input on the canvas. Projection math lives in
//! `projection`; this module only turns state into shapes.

use egui::{Align2, Color32, FontId, Pos2, Shape, Stroke};
use nalgebra::Vector2;

use crate::geo;
use crate::nav::NavTracker;
use crate::projection::{self, Camera, ViewMode};
use crate::telemetry::VehicleState;

/// Vehicle glyph half-size in pixels (constant regardless of zoom).
const ROV_SIZE: f32 = 20.0;
/// Target marker half-size in pixels.
const MARKER_SIZE: f32 = 12.0;
/// North indicator length in pixels.
const NORTH_LENGTH: f32 = 55.0;

const COLOR_ROV: Color32 = Color32::WHITE;
const COLOR_TRAIL: Color32 = Color32::RED;
const COLOR_TARGET: Color32 = Color32::from_rgb(255, 0, 255);
const COLOR_TARGET_INACTIVE: Color32 = Color32::from_rgb(153, 153, 153);
const COLOR_GUIDE_PRIMARY: Color32 = Color32::from_rgb(50, 205, 50);
const COLOR_GUIDE_SECONDARY: Color32 = Color32::GRAY;
const COLOR_GRID: Color32 = Color32::from_rgba_premultiplied(34, 34, 34, 128);
const COLOR_NORTH: Color32 = Color32::from_rgb(255, 68, 68);
const COLOR_BACKGROUND: Color32 = Color32::from_rgb(16, 16, 20);

const STROKE_TRAIL: f32 = 3.0;
const STROKE_TARGET: f32 = 3.0;
const STROKE_GUIDE: f32 = 2.0;

pub fn show(ui: &mut egui::Ui, vehicle: &VehicleState, nav: &NavTracker, camera: &mut Camera) {
    let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
    let rect = response.rect;
    let painter = painter.with_clip_rect(rect);

    if response.dragged() && !response.drag_started() {
        let drag = response.drag_delta();
        camera.pan_by_px(drag.x as f64, drag.y as f64);
    }
    if response.double_clicked() {
        camera.reset_pan();
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll > 0.0 {
            camera.zoom_in();
        } else if scroll < 0.0 {
            camera.zoom_out();
        }
    }
    if let Some(touch) = ui.input(|i| i.multi_touch()) {
        camera.set_scale(camera.scale() * touch.zoom_delta as f64);
    }

    painter.rect_filled(rect, 0.0, COLOR_BACKGROUND);

    let canvas = Vector2::new(rect.width() as f64, rect.height() as f64);
    let Some(position) = vehicle.position() else {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Waiting for position fix…",
            FontId::proportional(16.0),
            Color32::GRAY,
        );
        draw_scale_indicator(&painter, rect, camera);
        return;
    };
    let heading = vehicle.heading_deg;

    let scene = Scene { rect, canvas, position, heading };

    draw_grid(&painter, &scene, vehicle, camera);
    draw_trail(&painter, &scene, vehicle, camera);
    draw_targets(&painter, &scene, nav, camera);
    draw_rov(&painter, &scene, camera);
    draw_scale_indicator(&painter, rect, camera);
}

/// Per-frame projection context: canvas geometry plus the vehicle fix the
/// projection is referenced to.
struct Scene {
    rect: egui::Rect,
    canvas: Vector2<f64>,
    position: geo::GeoPoint,
    heading: f64,
}

impl Scene {
    fn to_pos2(&self, v: Vector2<f64>) -> Pos2 {
        self.rect.min + egui::vec2(v.x as f32, v.y as f32)
    }

    /// Project a geodetic point to a canvas position, view-mode rotation included.
    fn project(&self, point: geo::GeoPoint, camera: &Camera) -> Pos2 {
        self.to_pos2(projection::project(point, self.position, camera, self.canvas, self.heading))
    }

    /// Project world meters (relative to the vehicle) to a canvas position.
    fn world(&self, world_m: Vector2<f64>, camera: &Camera) -> Pos2 {
        let screen = projection::world_to_screen(world_m, camera, self.canvas);
        self.to_pos2(projection::rotate_for_view(screen, camera, self.canvas, self.heading))
    }

    fn center(&self, camera: &Camera) -> Pos2 {
        self.to_pos2(projection::scene_center(camera, self.canvas))
    }
}

fn draw_grid(painter: &egui::Painter, scene: &Scene, vehicle: &VehicleState, camera: &Camera) {
    let spacing = projection::grid_spacing_m(camera);
    let phase = vehicle.grid.offset_mod(spacing);
    let ppm = camera.px_per_meter();

    // Padding so the rotated grid still covers the corners in track-up mode.
    let pad = (scene.canvas.x * scene.canvas.x + scene.canvas.y * scene.canvas.y).sqrt() / 2.0;
    let center = projection::scene_center(camera, scene.canvas);
    let left = (-center.x - pad) / ppm;
    let right = (scene.canvas.x - center.x + pad) / ppm;
    let top = (-center.y - pad) / ppm;
    let bottom = (scene.canvas.y - center.y + pad) / ppm;

    let stroke = Stroke::new(1.0, COLOR_GRID);

    let mut x = (left / spacing).floor() * spacing - phase.x;
    while x <= right + spacing {
        let a = scene.world(Vector2::new(x, top), camera);
        let b = scene.world(Vector2::new(x, bottom), camera);
        painter.line_segment([a, b], stroke);
        x += spacing;
    }

    let mut y = (top / spacing).floor() * spacing - phase.y;
    while y <= bottom + spacing {
        let a = scene.world(Vector2::new(left, y), camera);
        let b = scene.world(Vector2::new(right, y), camera);
        painter.line_segment([a, b], stroke);
        y += spacing;
    }
}

fn draw_trail(painter: &egui::Painter, scene: &Scene, vehicle: &VehicleState, camera: &Camera) {
    if vehicle.trail.len() < 2 {
        return;
    }
    let points: Vec<Pos2> = vehicle.trail.iter().map(|&p| scene.project(p, camera)).collect();
    painter.add(Shape::line(points, Stroke::new(STROKE_TRAIL, COLOR_TRAIL)));
}

fn draw_targets(painter: &egui::Painter, scene: &Scene, nav: &NavTracker, camera: &Camera) {
    let targets = nav.targets();
    if targets.is_empty() {
        return;
    }

    // Connecting polyline over the whole route.
    if targets.len() > 1 {
        let points: Vec<Pos2> = targets.iter().map(|t| scene.project(t.position(), camera)).collect();
        painter.add(Shape::line(points, Stroke::new(1.0, COLOR_TARGET_INACTIVE)));
    }

    if let Some(active) = nav.active_index() {
        draw_guide(painter, scene, nav, camera, active, COLOR_GUIDE_PRIMARY, true);

        let prev = (active + targets.len() - 1) % targets.len();
        if prev != active {
            draw_guide(painter, scene, nav, camera, prev, COLOR_GUIDE_SECONDARY, false);
        }
    }

    for (index, target) in targets.iter().enumerate() {
        let pos = scene.project(target.position(), camera);
        let color = if nav.active_index() == Some(index) { COLOR_TARGET } else { COLOR_TARGET_INACTIVE };
        let stroke = Stroke::new(STROKE_TARGET, color);
        let s = MARKER_SIZE;
        painter.line_segment([pos + egui::vec2(-s, -s), pos + egui::vec2(s, s)], stroke);
        painter.line_segment([pos + egui::vec2(s, -s), pos + egui::vec2(-s, s)], stroke);
        if let Some(name) = &target.name {
            label_chip(painter, pos + egui::vec2(0.0, -s - 12.0), name, color);
        }
    }
}

/// Dashed guide line from the vehicle to a target, with distance and
/// bearing labels at the midpoint.
fn draw_guide(
    painter: &egui::Painter,
    scene: &Scene,
    nav: &NavTracker,
    camera: &Camera,
    index: usize,
    color: Color32,
    with_bearing: bool,
) {
    let target = &nav.targets()[index];
    let start = scene.center(camera);
    let end = scene.project(target.position(), camera);

    let diagonal = scene.rect.size().length() as f64 / 2.0;
    let (line_end, text_pos) = guide_endpoints(
        Vector2::new(start.x as f64, start.y as f64),
        Vector2::new(end.x as f64, end.y as f64),
        diagonal,
    );
    let line_end = Pos2::new(line_end.x as f32, line_end.y as f32);
    let text_pos = Pos2::new(text_pos.x as f32, text_pos.y as f32);

    painter.extend(Shape::dashed_line(
        &[start, line_end],
        Stroke::new(STROKE_GUIDE, color),
        5.0,
        5.0,
    ));

    let distance = geo::distance_m(scene.position, target.position());
    label_chip(painter, text_pos, &format!("{distance:.0} m"), color);
    if with_bearing {
        let bearing = geo::bearing_deg(scene.position, target.position());
        label_chip(painter, text_pos + egui::vec2(0.0, 18.0), &format!("{bearing:.0}°"), color);
    }
}

/// Where a guide line should end and where its label belongs. Targets
/// beyond the view keep a direction ray of bounded length, with the label
/// pulled back toward the vehicle.
fn guide_endpoints(start: Vector2<f64>, end: Vector2<f64>, diagonal: f64) -> (Vector2<f64>, Vector2<f64>) {
    let delta = end - start;
    let distance = delta.norm();
    if distance < 10.0 {
        return (end, start + delta / 2.0);
    }
    let dir = delta / distance;
    let visible = distance < diagonal;
    let line_end = if visible { end } else { start + dir * (diagonal * 1.5) };
    let text_distance = if visible { distance / 2.0 } else { (distance / 2.0).min(diagonal / 2.0) };
    (line_end, start + dir * text_distance)
}

fn draw_rov(painter: &egui::Painter, scene: &Scene, camera: &Camera) {
    let center = scene.center(camera);

    // In north-up mode the scene stays fixed and the glyph shows the true
    // heading; in track-up mode the glyph always points up.
    let glyph_angle = match camera.mode {
        ViewMode::TrackUp => 0.0_f32,
        ViewMode::NorthUp => (scene.heading as f32).to_radians(),
    };
    let rotate = |v: egui::Vec2| -> Pos2 {
        let (sin, cos) = glyph_angle.sin_cos();
        center + egui::vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    };

    let tip = rotate(egui::vec2(0.0, -ROV_SIZE));
    let notch = rotate(egui::vec2(0.0, ROV_SIZE / 2.0));
    let right = rotate(egui::vec2(ROV_SIZE, ROV_SIZE));
    let left = rotate(egui::vec2(-ROV_SIZE, ROV_SIZE));
    // The arrow is concave at the notch; egui fills convex polygons only,
    // so it is drawn as two halves.
    painter.add(Shape::convex_polygon(vec![tip, right, notch], COLOR_ROV, Stroke::NONE));
    painter.add(Shape::convex_polygon(vec![tip, notch, left], COLOR_ROV, Stroke::NONE));

    draw_north_indicator(painter, center, scene.heading, camera.mode);
}

fn draw_north_indicator(painter: &egui::Painter, center: Pos2, heading_deg: f64, mode: ViewMode) {
    // North points straight up in north-up mode and counter-rotates with
    // the scene in track-up mode.
    let angle = match mode {
        ViewMode::NorthUp => 0.0_f32,
        ViewMode::TrackUp => -(heading_deg as f32).to_radians(),
    };
    let dir = egui::vec2(angle.sin(), -angle.cos());
    let tip = center + dir * NORTH_LENGTH;

    painter.line_segment([center, tip], Stroke::new(3.5, COLOR_NORTH));

    let base = tip - dir * 10.0;
    let perp = egui::vec2(-dir.y, dir.x) * 6.0;
    painter.add(Shape::convex_polygon(
        vec![tip, base + perp, base - perp],
        COLOR_NORTH,
        Stroke::NONE,
    ));
    painter.text(
        center + dir * (NORTH_LENGTH + 12.0),
        Align2::CENTER_CENTER,
        "N",
        FontId::proportional(16.0),
        COLOR_NORTH,
    );
}

fn draw_scale_indicator(painter: &egui::Painter, rect: egui::Rect, camera: &Camera) {
    let spacing = projection::grid_spacing_m(camera);
    let text = format_spacing(spacing);
    painter.text(
        rect.left_bottom() + egui::vec2(20.0, -20.0),
        Align2::LEFT_BOTTOM,
        text,
        FontId::proportional(18.0),
        Color32::WHITE,
    );
}

pub fn format_spacing(spacing_m: f64) -> String {
    if spacing_m >= 1000.0 {
        format!("{:.1} km", spacing_m / 1000.0)
    } else {
        format!("{spacing_m:.0} m")
    }
}

/// Text label over a dimmed chip, readable on top of map clutter.
fn label_chip(painter: &egui::Painter, pos: Pos2, text: &str, color: Color32) {
    let galley = painter.layout_no_wrap(text.to_string(), FontId::proportional(14.0), color);
    let text_pos = pos - egui::vec2(galley.size().x / 2.0, galley.size().y / 2.0);
    let bg_rect = egui::Rect::from_min_size(text_pos, galley.size()).expand(3.0);
    painter.rect_filled(bg_rect, 3.0, Color32::from_rgba_unmultiplied(0, 0, 0, 160));
    painter.galley(text_pos, galley, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_target_keeps_its_endpoint() {
        let start = Vector2::new(100.0, 100.0);
        let end = Vector2::new(200.0, 100.0);
        let (line_end, text_pos) = guide_endpoints(start, end, 500.0);
        assert_eq!(line_end, end);
        assert_eq!(text_pos, Vector2::new(150.0, 100.0));
    }

    #[test]
    fn distant_target_gets_a_clamped_ray() {
        let start = Vector2::new(0.0, 0.0);
        let end = Vector2::new(10_000.0, 0.0);
        let (line_end, text_pos) = guide_endpoints(start, end, 400.0);
        assert_eq!(line_end, Vector2::new(600.0, 0.0));
        assert_eq!(text_pos, Vector2::new(200.0, 0.0));
    }

    #[test]
    fn touching_targets_center_the_label() {
        let start = Vector2::new(50.0, 50.0);
        let end = Vector2::new(53.0, 54.0);
        let (line_end, text_pos) = guide_endpoints(start, end, 400.0);
        assert_eq!(line_end, end);
        assert_eq!(text_pos, Vector2::new(51.5, 52.0));
    }

    #[test]
    fn spacing_formats_switch_to_km() {
        assert_eq!(format_spacing(5.0), "5 m");
        assert_eq!(format_spacing(250.0), "250 m");
        assert_eq!(format_spacing(1000.0), "1.0 km");
        assert_eq!(format_spacing(2500.0), "2.5 km");
    }
}
