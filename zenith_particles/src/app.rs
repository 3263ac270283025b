//! Top-level application state machine.
//!
//! `AppState` owns the `ParticleField` and the panel `Settings`, reads the
//! shared gesture cell once per frame and turns source notices into the
//! status overlay.  `run` wires it to a gesture source and the visualizer.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use gesture_vision::{CommandClassifier, FrameFormat, GestureReading, StillFrames};
use log::{debug, error, info};
use morph_field::{FrameTime, GestureCell, GestureState, Oscillation, ParticleField, Smoothing};

use crate::error::AppError;
use crate::gesture::{
    spawn_gesture_source, CameraGestureSource, GestureTask, SimGestureSource, SimInput,
    SourceNotice, DEFAULT_POLL_INTERVAL,
};
use crate::panel::{gesture_label, Change, ControlEvent, Settings};
use crate::visualizer::{Overlay, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where gesture states come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceMode {
    /// O / C / N keys in the window.
    Sim,
    /// Still frames from `frames`, classified by an external program.
    Camera {
        frames:     PathBuf,
        program:    String,
        args:       Vec<String>,
        interval:   Duration,
        timeout:    Duration,
        format:     FrameFormat,
    },
}

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub settings:    Settings,
    pub source:      SourceMode,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed:        Option<u64>,
    pub smoothing:   Smoothing,
    pub oscillation: Oscillation,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            settings:    Settings::default(),
            source:      SourceMode::Sim,
            seed:        None,
            smoothing:   Smoothing::default(),
            oscillation: Oscillation::default(),
        }
    }
}

impl SourceMode {
    /// Camera mode with the default polling interval and frame format.
    pub fn camera(frames: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        SourceMode::Camera {
            frames:   frames.into(),
            program:  program.into(),
            args:     Vec::new(),
            interval: DEFAULT_POLL_INTERVAL,
            timeout:  Duration::from_secs(10),
            format:   FrameFormat::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    // ── animation ─────────────────────────────────────────────────────────
    field:    ParticleField,
    settings: Settings,

    // ── gesture ───────────────────────────────────────────────────────────
    cell:     GestureCell,
    gesture:  GestureState,
    reading:  Option<GestureReading>,

    // ── notices ───────────────────────────────────────────────────────────
    camera_error: Option<String>,
    pub status:   String,
}

impl AppState {
    pub fn new(cfg: &AppConfig, cell: GestureCell) -> Self {
        let settings = cfg.settings;
        let field = match cfg.seed {
            Some(seed) => ParticleField::seeded(settings.shape, settings.count.get(), seed),
            None       => ParticleField::new(settings.shape, settings.count.get()),
        }
        .with_smoothing(cfg.smoothing)
        .with_oscillation(cfg.oscillation);

        AppState {
            field,
            settings,
            gesture:      cell.load(),
            cell,
            reading:      None,
            camera_error: None,
            status:       format!("Ready: {} x {}", settings.shape.label(), settings.count),
        }
    }

    // ── process one panel interaction ─────────────────────────────────────

    pub fn handle_control(&mut self, event: ControlEvent) {
        match self.settings.apply(event) {
            Change::Shape(shape) => {
                self.field.set_shape(shape);
                self.status = format!("Morphing to {}", shape.label());
            }
            Change::Count(count) => {
                self.field.set_count(count.get());
                self.status = format!("{} particles", count);
            }
            Change::Render => {
                self.status = format!(
                    "Point size {:.2}  colour {}",
                    self.settings.point_size, self.settings.color
                );
            }
            Change::Nothing => {}
        }
    }

    // ── process one source notice ─────────────────────────────────────────

    pub fn handle_notice(&mut self, notice: SourceNotice) {
        match notice {
            SourceNotice::CameraUnavailable(msg) => {
                self.status = "Camera unavailable".to_string();
                self.camera_error = Some(msg);
            }
            SourceNotice::CameraRestored => {
                self.status = "Camera restored".to_string();
                self.camera_error = None;
            }
            SourceNotice::Classified(reading) => {
                self.reading = Some(reading);
            }
        }
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self, frame: FrameTime) {
        self.gesture = self.cell.load();
        self.field.step(frame, self.gesture);
    }

    /// Status lines for the visualizer.
    pub fn overlay(&self, processing: bool) -> Overlay {
        let mut gesture = format!("Gesture: {}", gesture_label(self.gesture));
        if let Some(r) = self.reading.filter(|r| r.state == self.gesture) {
            gesture.push_str(&format!(" {:.0}%", r.confidence * 100.0));
        }

        Overlay {
            lines: vec![
                format!("Shape: {}", self.settings.shape.label()),
                format!("Particles: {}", self.settings.count),
                gesture,
                format!("Expansion: {:.2}", self.field.expansion()),
                self.status.clone(),
            ],
            processing,
            alert: self.camera_error.as_ref().map(|e| format!("Camera error: {}", e)),
        }
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn field(&self)    -> &ParticleField { &self.field }
    pub fn settings(&self) -> &Settings      { &self.settings }
    pub fn gesture(&self)  -> GestureState   { self.gesture }
}

// ════════════════════════════════════════════════════════════════════════════
// Gesture source startup
// ════════════════════════════════════════════════════════════════════════════

/// Start the configured source.  A camera that cannot be opened is not
/// fatal: the error is returned as a notice and no task runs.
fn start_source(
    mode: &SourceMode,
    cell: &GestureCell,
) -> (Option<mpsc::Sender<SimInput>>, Option<GestureTask>, Option<SourceNotice>) {
    match mode {
        SourceMode::Sim => {
            let (tx, rx) = mpsc::channel();
            let task = spawn_gesture_source(SimGestureSource { rx }, cell.clone());
            (Some(tx), Some(task), None)
        }
        SourceMode::Camera { frames, program, args, interval, timeout, format } => {
            match StillFrames::open(frames) {
                Ok(stills) => {
                    info!("camera: {} frames from {}", stills.len(), frames.display());
                    let classifier = CommandClassifier::new(program.clone())
                        .args(args.iter().cloned())
                        .timeout(*timeout);
                    let source = CameraGestureSource::new(stills, classifier)
                        .interval(*interval)
                        .format(*format);
                    (None, Some(spawn_gesture_source(source, cell.clone())), None)
                }
                Err(e) => {
                    error!("camera: {}", e);
                    (None, None, Some(SourceNotice::CameraUnavailable(e.to_string())))
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Opens the window, starts the gesture source and drives the
/// input / tick / render loop at ~60 fps until the window closes or Q is
/// pressed.  `max_frames` stops the loop early (used for smoke runs).
pub fn run(cfg: AppConfig, max_frames: Option<u64>) -> Result<(), AppError> {
    let cell = GestureCell::default();

    // ── Gesture source ────────────────────────────────────────────────────
    let (sim_tx, mut task, startup_notice) = start_source(&cfg.source, &cell);

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(&cfg, cell);
    if let Some(notice) = startup_notice {
        app.handle_notice(notice);
    }

    // ── Main loop ─────────────────────────────────────────────────────────
    let start = Instant::now();
    let mut last = start;
    let mut frames = 0u64;

    while vis.is_open() {
        // 1. Panel input (hand keys go straight to the sim source)
        let Some(controls) = vis.poll_input() else { break };
        for event in controls {
            app.handle_control(event);
        }

        // 2. Source notices
        if let Some(task) = &task {
            for notice in task.drain_notices() {
                app.handle_notice(notice);
            }
        }

        // 3. Per-frame logic
        let now = Instant::now();
        app.tick(FrameTime::new(
            now.duration_since(start).as_secs_f32(),
            now.duration_since(last).as_secs_f32(),
        ));
        last = now;

        // 4. Render
        let processing = task.as_ref().is_some_and(GestureTask::is_processing);
        vis.render(app.field(), app.settings(), &app.overlay(processing))?;

        frames += 1;
        if max_frames.is_some_and(|max| frames >= max) {
            debug!("frame limit {} reached", frames);
            break;
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────
    if let Some(task) = task.as_mut() {
        task.stop();
    }
    info!("closed after {} frames", frames);
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use morph_field::{ParticleCount, Shape};

    const DT: f32 = 1.0 / 60.0;

    fn make_app() -> (AppState, GestureCell) {
        let cfg = AppConfig {
            settings: Settings { count: ParticleCount::clamped(5_000), ..Settings::default() },
            seed: Some(11),
            ..AppConfig::default()
        };
        let cell = GestureCell::default();
        (AppState::new(&cfg, cell.clone()), cell)
    }

    fn run_frames(app: &mut AppState, n: usize) {
        for i in 0..n {
            app.tick(FrameTime::new(i as f32 * DT, DT));
        }
    }

    #[test]
    fn tick_reads_latest_gesture() {
        let (mut app, cell) = make_app();
        cell.store(GestureState::Open);
        cell.store(GestureState::Closed);
        run_frames(&mut app, 1);
        assert_eq!(app.gesture(), GestureState::Closed);
        assert!(app.field().expansion() < 1.0);
    }

    #[test]
    fn open_hand_expands_the_cloud() {
        let (mut app, cell) = make_app();
        cell.store(GestureState::Open);
        run_frames(&mut app, 120);
        assert!(app.field().expansion() > 2.0);
    }

    #[test]
    fn shape_change_keeps_live_positions() {
        let (mut app, _) = make_app();
        run_frames(&mut app, 10);
        let before = app.field().live().to_vec();
        app.handle_control(ControlEvent::SelectShape(Shape::Star));
        assert_eq!(app.field().shape(), Shape::Star);
        assert_eq!(app.field().live(), &before[..]);
        assert!(app.status.contains("Star"));
    }

    #[test]
    fn count_change_resizes_field() {
        let (mut app, _) = make_app();
        app.handle_control(ControlEvent::MoreParticles);
        assert_eq!(app.field().len(), 6_000);
        assert_eq!(app.settings().count.get(), 6_000);
    }

    #[test]
    fn count_floor_leaves_field_alone() {
        let (mut app, _) = make_app();
        app.handle_control(ControlEvent::FewerParticles);
        assert_eq!(app.field().len(), 5_000);
    }

    #[test]
    fn render_only_changes_do_not_touch_field() {
        let (mut app, _) = make_app();
        run_frames(&mut app, 5);
        let before = app.field().targets().to_vec();
        app.handle_control(ControlEvent::NextColor);
        app.handle_control(ControlEvent::LargerPoints);
        assert_eq!(app.field().targets(), &before[..]);
    }

    #[test]
    fn camera_notice_shows_and_clears() {
        let (mut app, _) = make_app();
        app.handle_notice(SourceNotice::CameraUnavailable("no device".into()));
        let alert = app.overlay(false).alert.unwrap();
        assert!(alert.contains("no device"));

        app.handle_notice(SourceNotice::CameraRestored);
        assert!(app.overlay(false).alert.is_none());
    }

    #[test]
    fn overlay_lists_shape_count_and_gesture() {
        let (mut app, cell) = make_app();
        cell.store(GestureState::Open);
        app.handle_notice(SourceNotice::Classified(GestureReading::new(GestureState::Open, 0.87)));
        run_frames(&mut app, 1);

        let overlay = app.overlay(true);
        assert!(overlay.processing);
        assert_eq!(overlay.lines[0], "Shape: Sphere");
        assert_eq!(overlay.lines[1], "Particles: 5000");
        assert_eq!(overlay.lines[2], "Gesture: Open (Expanded) 87%");
    }

    #[test]
    fn searching_label_without_hand() {
        let (mut app, _) = make_app();
        run_frames(&mut app, 1);
        assert_eq!(app.overlay(false).lines[2], "Gesture: Searching...");
    }

    #[test]
    fn missing_frames_dir_becomes_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mode = SourceMode::camera(dir.path().join("absent"), "true");
        let (tx, task, notice) = start_source(&mode, &GestureCell::default());
        assert!(tx.is_none() && task.is_none());
        assert!(matches!(notice, Some(SourceNotice::CameraUnavailable(_))));
    }

    #[test]
    fn sim_mode_hands_out_sender() {
        let (tx, task, notice) = start_source(&SourceMode::Sim, &GestureCell::default());
        assert!(tx.is_some() && task.is_some() && notice.is_none());
    }
}
