//! # zenith_particles
//!
//! A gesture-driven particle cloud.  Tens of thousands of points morph
//! between six target shapes; an open hand scatters the cloud and a fist
//! condenses it.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Expansion target | Status label |
//! |---|---|---|
//! | Open hand | 2.5 | Open (Expanded) |
//! | Fist | 0.4 | Closed (Contracted) |
//! | No hand / classifier failure | 1.0 | Searching... |
//!
//! ## Gesture sources
//!
//! * `sim` (default): keyboard keys in the window stand in for the hand.
//! * `camera`: a directory of captured frames is sampled every two seconds
//!   and each frame is classified by an external program (see
//!   [`gesture_vision::CommandClassifier`]).
//!
//! ### Keyboard shortcuts
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`6` | Sphere, Cube, Heart, Bottle, Torus, Star |
//! | `+` / `-` | ±1,000 particles (5,000–30,000) |
//! | `]` / `[` | Larger / smaller points |
//! | `K` | Next colour swatch |
//! | `O` / `C` / `N` | Open hand / fist / no hand (sim only) |
//! | `Q` / `Esc` | Quit |

pub mod app;
pub mod gesture;
pub mod panel;
pub mod visualizer;

mod error;

pub use error::AppError;
