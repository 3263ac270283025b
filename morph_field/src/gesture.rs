//! Discrete hand-gesture state and the single-slot cell that carries it from
//! the gesture source thread to the frame loop.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

/// Observed hand posture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GestureState {
    /// Fingers spread: scatter the cloud.
    Open,
    /// Fist: condense the cloud.
    Closed,
    /// No hand detected (or classification failed).
    #[default]
    NoHand,
}

impl GestureState {
    /// Wire label: `"open"`, `"closed"` or `"none"`.
    pub fn as_str(self) -> &'static str {
        match self {
            GestureState::Open   => "open",
            GestureState::Closed => "closed",
            GestureState::NoHand => "none",
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            GestureState::NoHand => 0,
            GestureState::Open   => 1,
            GestureState::Closed => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => GestureState::Open,
            2 => GestureState::Closed,
            _ => GestureState::NoHand,
        }
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureState {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open"   => Ok(GestureState::Open),
            "closed" => Ok(GestureState::Closed),
            "none"   => Ok(GestureState::NoHand),
            _        => Err(ConfigError::UnknownGesture(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureCell: last value wins
// ════════════════════════════════════════════════════════════════════════════

/// Shared single-slot holder for the latest [`GestureState`].
///
/// One writer (the gesture source) and one reader (the frame loop).  There
/// is no queue: a reader only ever sees the most recent store, and missing
/// intermediate values is fine.
#[derive(Clone, Debug, Default)]
pub struct GestureCell {
    slot: Arc<AtomicU8>,
}

impl GestureCell {
    pub fn new(initial: GestureState) -> Self {
        GestureCell { slot: Arc::new(AtomicU8::new(initial.to_bits())) }
    }

    /// Publish a new state, replacing whatever was there.
    pub fn store(&self, state: GestureState) {
        self.slot.store(state.to_bits(), Ordering::Release);
    }

    /// Latest committed state.
    pub fn load(&self) -> GestureState {
        GestureState::from_bits(self.slot.load(Ordering::Acquire))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn default_is_no_hand() {
        assert_eq!(GestureState::default(), GestureState::NoHand);
        assert_eq!(GestureCell::default().load(), GestureState::NoHand);
    }

    #[test]
    fn labels_round_trip() {
        for s in [GestureState::Open, GestureState::Closed, GestureState::NoHand] {
            assert_eq!(s.as_str().parse::<GestureState>().unwrap(), s);
        }
        assert!("wave".parse::<GestureState>().is_err());
    }

    #[test]
    fn cell_last_value_wins() {
        let cell = GestureCell::new(GestureState::NoHand);
        cell.store(GestureState::Open);
        cell.store(GestureState::Closed);
        assert_eq!(cell.load(), GestureState::Closed);
    }

    #[test]
    fn cell_is_shared_across_threads() {
        let cell = GestureCell::default();
        let writer = cell.clone();
        thread::spawn(move || writer.store(GestureState::Open))
            .join()
            .unwrap();
        assert_eq!(cell.load(), GestureState::Open);
    }
}
