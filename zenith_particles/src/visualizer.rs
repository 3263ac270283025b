//! Software-rendered visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────────┐
//! │ ZENITH PARTICLES │                                                  │
//! │ shape / count    │                                                  │
//! │ gesture  ●       │            rotating particle cloud               │
//! └──────────────────┘                                                  │
//! │                                                  ┌──────────────────┤
//! │ key legend                                       │ camera notice    │
//! └──────────────────────────────────────────────────┴──────────────────┘
//! ```
//!
//! Points are projected through a perspective camera on the +Z axis,
//! sized by distance and added onto the frame (additive blending), so dense
//! regions glow.

use std::sync::mpsc::Sender;

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use morph_field::{ParticleField, Shape};

use crate::error::AppError;
use crate::gesture::{SimInput, SimKey};
use crate::panel::{ControlEvent, Settings};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 1280;
pub const WIN_H:       usize = 720;
const BG_COLOR:        u32   = 0xFF050505;
const PANEL_BG:        u32   = 0xFF101014;
const PANEL_BORDER:    u32   = 0xFF2A2A33;
const TITLE_COLOR:     u32   = 0xFF7AA7FF;
const TEXT_COLOR:      u32   = 0xFFEEEEEE;
const LEGEND_COLOR:    u32   = 0xFF777777;
const BUSY_COLOR:      u32   = 0xFFFACC15;  // yellow: request in flight
const IDLE_COLOR:      u32   = 0xFF22C55E;  // green
const ALERT_BG:        u32   = 0xFF3B0D0D;
const ALERT_COLOR:     u32   = 0xFFFECACA;
const PANEL_X:         usize = 16;
const PANEL_Y:         usize = 16;
const PANEL_W:         usize = 300;
const TEXT_SCALE:      usize = 2;
const LINE_H:          usize = 6 * TEXT_SCALE + 6;
const OPACITY:         f32   = 0.8;

const LEGEND: &str = "1-6 shape  +/- count  [ ] size  k colour  o/c/n hand  q quit";

// ════════════════════════════════════════════════════════════════════════════
// Camera
// ════════════════════════════════════════════════════════════════════════════

/// A projected point in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x:     f32,
    pub y:     f32,
    /// Distance in front of the camera.
    pub depth: f32,
}

/// Perspective camera at `(0, 0, distance)` looking at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub distance: f32,
    /// Vertical field of view, degrees.
    pub fov_y:    f32,
    pub width:    usize,
    pub height:   usize,
    pub near:     f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera { distance: 40.0, fov_y: 60.0, width: WIN_W, height: WIN_H, near: 0.1 }
    }
}

impl Camera {
    /// Pixels per world unit at depth 1.
    pub fn focal(&self) -> f32 {
        self.height as f32 * 0.5 / (self.fov_y.to_radians() * 0.5).tan()
    }

    /// Rotate `p` about Y by `rotation_y`, then project.  `None` behind the
    /// near plane.
    pub fn project(&self, p: [f32; 3], rotation_y: f32) -> Option<Projected> {
        let (s, c) = rotation_y.sin_cos();
        let x =  p[0] * c + p[2] * s;
        let z = -p[0] * s + p[2] * c;
        let depth = self.distance - z;
        if depth <= self.near {
            return None;
        }
        let f = self.focal() / depth;
        Some(Projected {
            x:     self.width  as f32 * 0.5 + x * f,
            y:     self.height as f32 * 0.5 - p[1] * f,
            depth,
        })
    }

    /// On-screen diameter of a point of world size `size` at `depth`.
    pub fn point_diameter(&self, size: f32, depth: f32) -> f32 {
        size * (self.height as f32 * 0.5) / depth
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

/// Text drawn over the scene.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overlay {
    pub lines:      Vec<String>,
    /// Classification request in flight.
    pub processing: bool,
    /// Camera trouble, shown until cleared.
    pub alert:      Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas: the framebuffer and its drawing primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    pub buf: Vec<u32>,
    w:       usize,
    h:       usize,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { buf: vec![BG_COLOR; w * h], w, h }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 { self.buf[y * self.w + x] }

    pub fn clear(&mut self) { self.buf.fill(BG_COLOR); }

    /// Draw every particle of `field` with the current settings.
    pub fn draw_field(&mut self, field: &ParticleField, settings: &Settings, camera: &Camera) {
        let color = settings.color.to_argb();
        let rot   = field.rotation_y();
        for (p, &size) in field.live().chunks_exact(3).zip(field.sizes()) {
            if let Some(pt) = camera.project([p[0], p[1], p[2]], rot) {
                let d = camera.point_diameter(settings.point_size * size, pt.depth);
                self.splat(pt.x, pt.y, d, color);
            }
        }
    }

    /// Additively draw a round point of diameter `d` centred on `(x, y)`.
    ///
    /// Sub-pixel points light a single pixel in proportion to their area.
    pub fn splat(&mut self, x: f32, y: f32, d: f32, color: u32) {
        if d < 1.0 {
            if x >= 0.0 && y >= 0.0 {
                self.add_pixel(x as usize, y as usize, color, OPACITY * d * d);
            }
            return;
        }
        let r = d * 0.5;
        let (x0, x1) = ((x - r).floor().max(0.0) as usize, (x + r).ceil().max(0.0) as usize);
        let (y0, y1) = ((y - r).floor().max(0.0) as usize, (y + r).ceil().max(0.0) as usize);
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - x;
                let dy = py as f32 + 0.5 - y;
                if dx * dx + dy * dy <= r * r {
                    self.add_pixel(px, py, color, OPACITY);
                }
            }
        }
    }

    fn add_pixel(&mut self, x: usize, y: usize, color: u32, intensity: f32) {
        if x < self.w && y < self.h {
            let i = y * self.w + x;
            self.buf[i] = add_blend(self.buf[i], color, intensity);
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(self.w) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(self.h) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.w && y < self.h {
            self.buf[y * self.w + x] = color;
        }
    }

    /// Render `text` in the 3×5 bitmap font, each dot `scale` pixels wide.
    pub fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            for (row, &bits) in glyph_rows(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > self.w { break; }
        }
    }

    pub fn draw_overlay(&mut self, overlay: &Overlay) {
        // ── Status panel ──────────────────────────────────────────────────
        let panel_h = (overlay.lines.len() + 1) * LINE_H + 12;
        self.fill_rect(PANEL_X, PANEL_Y, PANEL_W, panel_h, PANEL_BG);
        self.draw_border(PANEL_X, PANEL_Y, PANEL_W, panel_h, PANEL_BORDER);
        self.draw_label("ZENITH PARTICLES", PANEL_X + 12, PANEL_Y + 10, TEXT_SCALE, TITLE_COLOR);

        let dot = if overlay.processing { BUSY_COLOR } else { IDLE_COLOR };
        self.fill_rect(PANEL_X + PANEL_W - 24, PANEL_Y + 10, 10, 10, dot);

        for (i, line) in overlay.lines.iter().enumerate() {
            let y = PANEL_Y + 10 + (i + 1) * LINE_H;
            self.draw_label(line, PANEL_X + 12, y, TEXT_SCALE, TEXT_COLOR);
        }

        // ── Camera notice ─────────────────────────────────────────────────
        if let Some(alert) = &overlay.alert {
            let w = (alert.chars().count() * 4 * TEXT_SCALE + 24).min(self.w / 2);
            let x = self.w.saturating_sub(w + 16);
            let y = self.h.saturating_sub(LINE_H + 28);
            self.fill_rect(x, y, w, LINE_H + 12, ALERT_BG);
            self.draw_label(alert, x + 12, y + 9, TEXT_SCALE, ALERT_COLOR);
        }

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_label(LEGEND, 16, self.h.saturating_sub(20), TEXT_SCALE, LEGEND_COLOR);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer: window + input
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
    camera: Camera,
    /// Present only when the keyboard drives the gesture.
    sim_tx: Option<Sender<SimInput>>,
}

impl Visualizer {
    pub fn new(sim_tx: Option<Sender<SimInput>>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Zenith Particles",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.set_target_fps(60);

        Ok(Visualizer {
            window,
            canvas: Canvas::new(WIN_W, WIN_H),
            camera: Camera::default(),
            sim_tx,
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll the keyboard.  Panel keys come back as [`ControlEvent`]s; hand
    /// keys go to the simulation source.  `None` means quit.
    pub fn poll_input(&mut self) -> Option<Vec<ControlEvent>> {
        if !self.window.is_open() { return None; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            return None;
        }

        let mut events = Vec::new();

        const SHAPE_KEYS: [Key; 6] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6];
        for (key, shape) in SHAPE_KEYS.iter().zip(Shape::ALL) {
            if one_shot(*key) {
                events.push(ControlEvent::SelectShape(shape));
            }
        }

        if held(Key::Equal) || held(Key::NumPadPlus) || held(Key::Up) {
            events.push(ControlEvent::MoreParticles);
        }
        if held(Key::Minus) || held(Key::NumPadMinus) || held(Key::Down) {
            events.push(ControlEvent::FewerParticles);
        }
        if held(Key::RightBracket) { events.push(ControlEvent::LargerPoints); }
        if held(Key::LeftBracket)  { events.push(ControlEvent::SmallerPoints); }
        if one_shot(Key::K)        { events.push(ControlEvent::NextColor); }

        if let Some(tx) = &self.sim_tx {
            for (key, sim) in [(Key::O, SimKey::OpenHand), (Key::C, SimKey::ClosedHand), (Key::N, SimKey::NoHand)] {
                if one_shot(key) {
                    let _ = tx.send(SimInput::KeyDown(sim));
                }
            }
        }

        Some(events)
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        field:    &ParticleField,
        settings: &Settings,
        overlay:  &Overlay,
    ) -> Result<(), AppError> {
        self.canvas.clear();
        self.canvas.draw_field(field, settings, &self.camera);
        self.canvas.draw_overlay(overlay);

        self.window
            .update_with_buffer(&self.canvas.buf, WIN_W, WIN_H)
            .map_err(|e| AppError::Window(e.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// Lit cells are `#`, rows are separated by `|`.  Letters are stored
/// upper-case; lower-case input maps onto them.
const FONT: &[(char, &str)] = &[
    ('0', "###|#.#|#.#|#.#|###"), ('1', ".#.|##.|.#.|.#.|###"), ('2', "###|..#|###|#..|###"),
    ('3', "###|..#|###|..#|###"), ('4', "#.#|#.#|###|..#|..#"), ('5', "###|#..|###|..#|###"),
    ('6', "###|#..|###|#.#|###"), ('7', "###|..#|..#|..#|..#"), ('8', "###|#.#|###|#.#|###"),
    ('9', "###|#.#|###|..#|###"), ('A', "###|#.#|###|#.#|#.#"), ('B', "##.|#.#|##.|#.#|##."),
    ('C', "###|#..|#..|#..|###"), ('D', "##.|#.#|#.#|#.#|##."), ('E', "###|#..|###|#..|###"),
    ('F', "###|#..|###|#..|#.."), ('G', "###|#..|#.#|#.#|###"), ('H', "#.#|#.#|###|#.#|#.#"),
    ('I', "###|.#.|.#.|.#.|###"), ('J', "..#|..#|..#|#.#|###"), ('K', "#.#|#.#|##.|#.#|#.#"),
    ('L', "#..|#..|#..|#..|###"), ('M', "#.#|###|#.#|#.#|#.#"), ('N', "###|#.#|#.#|#.#|#.#"),
    ('O', "###|#.#|#.#|#.#|###"), ('P', "###|#.#|###|#..|#.."), ('Q', "###|#.#|###|..#|..#"),
    ('R', "##.|#.#|##.|#.#|#.#"), ('S', "###|#..|###|..#|###"), ('T', "###|.#.|.#.|.#.|.#."),
    ('U', "#.#|#.#|#.#|#.#|###"), ('V', "#.#|#.#|#.#|.#.|.#."), ('W', "#.#|#.#|#.#|###|#.#"),
    ('X', "#.#|#.#|.#.|#.#|#.#"), ('Y', "#.#|#.#|###|.#.|.#."), ('Z', "###|..#|.#.|#..|###"),
    ('(', ".#.|#..|#..|#..|.#."), (')', ".#.|..#|..#|..#|.#."), ('[', "##.|#..|#..|#..|##."),
    (']', ".##|..#|..#|..#|.##"), ('#', "#.#|###|#.#|###|#.#"), ('%', "#.#|..#|.#.|#..|#.#"),
    ('!', ".#.|.#.|.#.|...|.#."), ('/', "..#|..#|.#.|#..|#.."), ('-', "...|...|###|...|..."),
    ('.', "...|...|...|...|.#."), (',', "...|...|...|.#.|#.."), (':', "...|.#.|...|.#.|..."),
    ('=', "...|###|...|###|..."), ('+', "...|.#.|###|.#.|..."), (' ', "...|...|...|...|..."),
];

/// Unknown characters render as a centred dot.
const MISSING_GLYPH: [u8; 5] = [0b000, 0b000, 0b010, 0b000, 0b000];

/// Row bitmasks for `c`, most significant bit on the left.
fn glyph_rows(c: char) -> [u8; 5] {
    let c = c.to_ascii_uppercase();
    let Some(&(_, art)) = FONT.iter().find(|&&(k, _)| k == c) else {
        return MISSING_GLYPH;
    };
    let mut rows = [0u8; 5];
    for (row, cells) in rows.iter_mut().zip(art.split('|')) {
        *row = cells.bytes().fold(0, |acc, b| (acc << 1) | u8::from(b == b'#'));
    }
    rows
}

/// Add `intensity × color` onto `dst`, saturating each channel.
fn add_blend(dst: u32, color: u32, intensity: f32) -> u32 {
    let k = intensity.clamp(0.0, 1.0);
    let add = |shift: u32| {
        let d = (dst >> shift) & 0xFF;
        let c = ((color >> shift) & 0xFF) as f32 * k;
        (d + c.round() as u32).min(0xFF) << shift
    };
    0xFF000000 | add(16) | add(8) | add(0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
