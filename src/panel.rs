//! Control panel: position readout, view options and target management.

use egui::RichText;

use crate::app::App;
use crate::nav::Target;
use crate::projection::ViewMode;

enum RowAction {
    Select(usize),
    Remove(usize),
    Up(usize),
    Down(usize),
    Commit(usize),
}

impl App {
    pub(crate) fn show_panel(&mut self, ui: &mut egui::Ui) {
        ui.label(RichText::new("Vehicle").strong());
        match self.vehicle.position() {
            Some(pos) => {
                ui.monospace(format!("ROV: {:.7}°, {:.7}°", pos.lat, pos.lon));
                ui.monospace(format!("Heading: {:.1}°", self.vehicle.heading_deg));
                if let Some(at) = self.vehicle.last_fix_at {
                    ui.label(
                        RichText::new(format!("Last fix {}", at.format("%H:%M:%S UTC"))).weak(),
                    );
                }
            }
            None => {
                ui.label(RichText::new("No position fix yet").weak());
            }
        }

        ui.separator();
        ui.label(RichText::new("View").strong());
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.camera.mode, ViewMode::TrackUp, "Track-up");
            ui.selectable_value(&mut self.camera.mode, ViewMode::NorthUp, "North-up");
        });
        ui.horizontal(|ui| {
            ui.label("Zoom:");
            if ui.button("−").clicked() {
                self.camera.zoom_out();
            }
            ui.label(format!("{:.2}×", self.camera.scale()));
            if ui.button("+").clicked() {
                self.camera.zoom_in();
            }
            if ui.button("Reset pan").clicked() {
                self.camera.reset_pan();
            }
        });

        let mut demo_on = self.sim.is_some();
        if ui.checkbox(&mut demo_on, "Demo telemetry").changed() {
            self.toggle_demo();
        }

        ui.separator();
        ui.label(RichText::new("Targets").strong());
        self.show_target_rows(ui);

        ui.horizontal(|ui| {
            let edit = ui.add(
                egui::TextEdit::singleline(&mut self.new_target_input)
                    .hint_text("lat, lon")
                    .desired_width(150.0),
            );
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Add").clicked() || submitted {
                self.submit_new_target();
            }
        });
        if !self.nav.is_empty() && ui.button("Clear all").clicked() {
            self.nav.clear();
            self.targets_changed();
        }

        #[cfg(not(target_arch = "wasm32"))]
        self.show_import(ui);

        ui.separator();
        ui.label(RichText::new(format!("trail-viz {}", env!("GIT_HASH"))).weak());
    }

    fn show_target_rows(&mut self, ui: &mut egui::Ui) {
        let mut action = None;
        let active = self.nav.active_index();
        let count = self.nav.len();

        for index in 0..count {
            ui.horizontal(|ui| {
                if ui.small_button("▲").clicked() {
                    action = Some(RowAction::Up(index));
                }
                if ui.small_button("▼").clicked() {
                    action = Some(RowAction::Down(index));
                }

                let label = match &self.nav.targets()[index].name {
                    Some(name) => format!("{} ({name})", index + 1),
                    None => format!("{}", index + 1),
                };
                if ui
                    .selectable_label(active == Some(index), label)
                    .on_hover_text("Set as active target")
                    .clicked()
                {
                    action = Some(RowAction::Select(index));
                }

                let edit = ui.add(
                    egui::TextEdit::singleline(&mut self.target_inputs[index])
                        .desired_width(140.0),
                );
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    action = Some(RowAction::Commit(index));
                }

                if ui.small_button("✕").clicked() {
                    action = Some(RowAction::Remove(index));
                }
            });
        }

        if let Some(action) = action {
            self.apply_row_action(action);
        }
    }

    fn apply_row_action(&mut self, action: RowAction) {
        match action {
            RowAction::Select(i) => {
                self.nav.select(i);
                return; // selection is not persisted state
            }
            RowAction::Remove(i) => self.nav.remove(i),
            RowAction::Up(i) => self.nav.move_up(i),
            RowAction::Down(i) => self.nav.move_down(i),
            RowAction::Commit(i) => match parse_lat_lon(&self.target_inputs[i]) {
                Some((lat, lon)) => self.nav.set_coords(i, lat, lon),
                None => {
                    log::warn!("invalid coordinates {:?}, use \"lat, lon\"", self.target_inputs[i]);
                    self.rebuild_target_inputs();
                    return;
                }
            },
        }
        self.targets_changed();
    }

    fn submit_new_target(&mut self) {
        let Some((lat, lon)) = parse_lat_lon(&self.new_target_input) else {
            log::warn!("invalid coordinates {:?}, use \"lat, lon\"", self.new_target_input);
            return;
        };
        self.nav.add(Target::new(lat, lon));
        self.new_target_input.clear();
        self.targets_changed();
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn show_import(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.label(RichText::new("Import waypoints").strong());
        ui.horizontal(|ui| {
            ui.add(
                egui::TextEdit::singleline(&mut self.import_path_input)
                    .hint_text("path to .gpx or .kml")
                    .desired_width(180.0),
            );
            if ui.button("Import").clicked() {
                self.run_import();
            }
        });
        if let Some(status) = &self.import_status {
            ui.label(RichText::new(status).weak());
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn run_import(&mut self) {
        let path = std::path::PathBuf::from(self.import_path_input.trim());
        match crate::import::import_path(&path) {
            Ok(targets) => {
                self.import_status = Some(format!("Imported {} waypoints", targets.len()));
                log::info!("imported {} waypoints from {}", targets.len(), path.display());
                self.nav.replace_all(targets);
                self.targets_changed();
            }
            Err(e) => {
                self.import_status = Some(format!("Import failed: {e}"));
                log::error!("error importing {}: {e}", path.display());
            }
        }
    }
}

/// Parse user-entered "lat, lon" text. Anything not exactly two finite
/// numbers is rejected.
pub(crate) fn parse_lat_lon(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split(',');
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    let lon: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some((lat, lon))
}
