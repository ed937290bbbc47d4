//! Application shell and eframe integration.
//!
//! Owns the live vehicle state, the target tracker, the camera and the
//! telemetry channel; the update loop drains incoming samples, runs the
//! proximity check, and lays out the map canvas plus the control panel.

use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use crate::demo::SimFeed;
use crate::geo::GeoPoint;
use crate::map;
use crate::nav::NavTracker;
use crate::projection::Camera;
use crate::storage::TargetStore;
use crate::telemetry::{self, TelemetrySample, VehicleState};

/// Redraw cadence: canvas updates are decoupled from telemetry push rate.
const REDRAW_INTERVAL: Duration = Duration::from_millis(1000 / 24);

/// Where the demo vehicle starts when no telemetry has been seen yet.
const DEMO_START: GeoPoint = GeoPoint { lat: 63.4305, lon: 10.3951 };

pub struct App {
    pub(crate) vehicle: VehicleState,
    pub(crate) nav: NavTracker,
    pub(crate) camera: Camera,
    store: Box<dyn TargetStore>,
    telemetry_tx: Sender<TelemetrySample>,
    telemetry_rx: Receiver<TelemetrySample>,
    pub(crate) sim: Option<SimFeed>,
    // panel input buffers
    pub(crate) target_inputs: Vec<String>,
    pub(crate) new_target_input: String,
    pub(crate) import_path_input: String,
    pub(crate) import_status: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let store: Box<dyn TargetStore> = Box::new(crate::storage::JsonFileStore::in_cache_dir());
        #[cfg(target_arch = "wasm32")]
        let store: Box<dyn TargetStore> = Box::new(crate::storage::MemoryStore::default());

        Self::with_store(store)
    }
}

impl App {
    pub fn with_store(store: Box<dyn TargetStore>) -> Self {
        let (telemetry_tx, telemetry_rx) = telemetry::channel();
        let mut nav = NavTracker::new();
        let saved = store.load();
        if !saved.is_empty() {
            log::info!("restored {} saved targets", saved.len());
            nav.replace_all(saved);
        }
        let mut app = Self {
            vehicle: VehicleState::new(),
            nav,
            camera: Camera::default(),
            store,
            telemetry_tx,
            telemetry_rx,
            sim: None,
            target_inputs: Vec::new(),
            new_target_input: String::new(),
            import_path_input: String::new(),
            import_status: None,
        };
        app.rebuild_target_inputs();
        app
    }

    /// Sender half of the telemetry channel, for wiring up a bus bridge.
    pub fn telemetry_sender(&self) -> Sender<TelemetrySample> {
        self.telemetry_tx.clone()
    }

    pub(crate) fn toggle_demo(&mut self) {
        self.sim = match self.sim.take() {
            Some(_) => None,
            None => {
                let sim = SimFeed::new(self.vehicle.position().unwrap_or(DEMO_START));
                let start = sim.position();
                log::info!("demo feed started at {:.4}, {:.4}", start.lat, start.lon);
                Some(sim)
            }
        };
    }

    /// Persist the target list and refresh the panel's edit buffers.
    /// Called after every mutation of the tracker.
    pub(crate) fn targets_changed(&mut self) {
        self.store.save(self.nav.targets());
        self.rebuild_target_inputs();
    }

    pub(crate) fn rebuild_target_inputs(&mut self) {
        self.target_inputs = self
            .nav
            .targets()
            .iter()
            .map(|t| format!("{}, {}", t.lat, t.lon))
            .collect();
    }

    fn drain_telemetry(&mut self) {
        while let Ok(sample) = self.telemetry_rx.try_recv() {
            if let Some(pos) = self.vehicle.ingest(sample) {
                self.nav.update_position(pos);
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.stable_dt) as f64;
        if let Some(sim) = &mut self.sim {
            sim.tick(dt, &self.telemetry_tx);
        }
        self.drain_telemetry();

        egui::SidePanel::right("controls")
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.show_panel(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::default().inner_margin(0.0))
            .show(ctx, |ui| {
                map::show(ui, &self.vehicle, &self.nav, &mut self.camera);
            });

        ctx.request_repaint_after(REDRAW_INTERVAL);
    }
}
