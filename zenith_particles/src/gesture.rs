//! Gesture sources: where the open / closed / none signal comes from.
//!
//! A source runs on its own thread and publishes into a shared
//! [`GestureCell`].  The frame loop reads the cell once per frame and never
//! waits on the source, so a slow classifier can only make the gesture
//! stale, never stall the animation.
//!
//! Out-of-band news for the status line (camera trouble, the latest
//! reading) travels separately as [`SourceNotice`]s over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gesture_vision::{
    classify_or_neutral, encode_frame, FrameFormat, FrameSource, GestureClassifier, GestureReading,
};
use log::{debug, info, warn};
use morph_field::{GestureCell, GestureState};

/// Default spacing between camera classifications.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Granularity at which a sleeping source notices cancellation.
const STOP_CHECK: Duration = Duration::from_millis(20);

// ════════════════════════════════════════════════════════════════════════════
// SourceNotice
// ════════════════════════════════════════════════════════════════════════════

/// Status news from a gesture source.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceNotice {
    /// A frame could not be acquired.  Shown until the camera recovers.
    CameraUnavailable(String),
    /// Frames are flowing again after a failure.
    CameraRestored,
    /// A classification finished and was published.
    Classified(GestureReading),
}

// ════════════════════════════════════════════════════════════════════════════
// GestureLink: what a running source may touch
// ════════════════════════════════════════════════════════════════════════════

/// The running source's side of a [`GestureTask`].
pub struct GestureLink {
    cell:       GestureCell,
    stop:       Arc<AtomicBool>,
    processing: Arc<AtomicBool>,
    notices:    Sender<SourceNotice>,
}

impl GestureLink {
    pub fn is_stopped(&self) -> bool { self.stop.load(Ordering::Acquire) }

    /// Publish `state` unless the task has been cancelled.
    ///
    /// Returns false if the value was discarded.
    pub fn publish(&self, state: GestureState) -> bool {
        if self.is_stopped() {
            debug!("gesture: task cancelled, discarding {}", state);
            return false;
        }
        self.cell.store(state);
        true
    }

    pub fn notify(&self, notice: SourceNotice) {
        // The UI may already be gone during teardown.
        let _ = self.notices.send(notice);
    }

    fn set_processing(&self, on: bool) {
        self.processing.store(on, Ordering::Release);
    }

    /// Sleep for `d`, waking early on cancellation.  False if cancelled.
    fn wait(&self, d: Duration) -> bool {
        let deadline = Instant::now() + d;
        loop {
            if self.is_stopped() { return false; }
            let now = Instant::now();
            if now >= deadline { return true; }
            thread::sleep((deadline - now).min(STOP_CHECK));
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSource trait: unified interface for camera and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can keep a [`GestureCell`] up to date.
pub trait GestureSource: Send + 'static {
    fn run(self: Box<Self>, link: GestureLink);
}

// ════════════════════════════════════════════════════════════════════════════
// GestureTask + spawn helper
// ════════════════════════════════════════════════════════════════════════════

/// Handle on a running gesture source.  Dropping it cancels the source.
pub struct GestureTask {
    stop:       Arc<AtomicBool>,
    processing: Arc<AtomicBool>,
    notices:    Receiver<SourceNotice>,
    handle:     Option<JoinHandle<()>>,
}

impl GestureTask {
    /// Ask the source to stop.  Does not wait: a classification in flight
    /// finishes in the background and its result is thrown away.
    pub fn stop(&mut self) {
        if !self.stop.swap(true, Ordering::AcqRel) {
            info!("gesture: stopping source");
        }
        self.handle.take();
    }

    /// True while a classification request is outstanding.
    pub fn is_processing(&self) -> bool { self.processing.load(Ordering::Acquire) }

    /// True until the source thread has returned.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Collect every notice sent since the last call.
    pub fn drain_notices(&self) -> Vec<SourceNotice> {
        let mut out = Vec::new();
        while let Ok(n) = self.notices.try_recv() { out.push(n); }
        out
    }
}

impl Drop for GestureTask {
    fn drop(&mut self) { self.stop(); }
}

/// Spawn a gesture source on its own thread, publishing into `cell`.
pub fn spawn_gesture_source<G: GestureSource>(source: G, cell: GestureCell) -> GestureTask {
    let stop       = Arc::new(AtomicBool::new(false));
    let processing = Arc::new(AtomicBool::new(false));
    let (tx, rx)   = mpsc::channel();

    let link = GestureLink {
        cell,
        stop:       Arc::clone(&stop),
        processing: Arc::clone(&processing),
        notices:    tx,
    };
    let handle = thread::spawn(move || Box::new(source).run(link));

    GestureTask { stop, processing, notices: rx, handle: Some(handle) }
}

// ════════════════════════════════════════════════════════════════════════════
// SimGestureSource: keyboard simulation
// ════════════════════════════════════════════════════════════════════════════

/// Gesture source driven by [`SimInput`] events from the visualizer window.
///
/// Ends when the window drops its sender.
pub struct SimGestureSource {
    pub rx: Receiver<SimInput>,
}

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimInput {
    KeyDown(SimKey),
}

/// Simulated hand keys (mapped from minifb Key).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    OpenHand,   // O
    ClosedHand, // C
    NoHand,     // N
}

impl GestureSource for SimGestureSource {
    fn run(self: Box<Self>, link: GestureLink) {
        for input in self.rx {
            let state = match input {
                SimInput::KeyDown(SimKey::OpenHand)   => GestureState::Open,
                SimInput::KeyDown(SimKey::ClosedHand) => GestureState::Closed,
                SimInput::KeyDown(SimKey::NoHand)     => GestureState::NoHand,
            };
            if !link.publish(state) { return; }
            link.notify(SourceNotice::Classified(GestureReading::new(state, 1.0)));
        }
        debug!("gesture: sim input closed");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CameraGestureSource: periodic frame classification
// ════════════════════════════════════════════════════════════════════════════

/// Classifies one camera frame every `interval`.
///
/// The first frame is taken one interval after start.  Classifier failures
/// publish `none`; a frame that cannot be grabbed or encoded leaves the
/// last published state in place.
pub struct CameraGestureSource<F, C> {
    frames:     F,
    classifier: C,
    format:     FrameFormat,
    interval:   Duration,
}

impl<F: FrameSource, C: GestureClassifier> CameraGestureSource<F, C> {
    pub fn new(frames: F, classifier: C) -> Self {
        CameraGestureSource {
            frames,
            classifier,
            format:   FrameFormat::default(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }
}

impl<F, C> GestureSource for CameraGestureSource<F, C>
where
    F: FrameSource + 'static,
    C: GestureClassifier + 'static,
{
    fn run(self: Box<Self>, link: GestureLink) {
        let CameraGestureSource { mut frames, mut classifier, format, interval } = *self;
        info!("gesture: camera polling every {:?}", interval);

        let mut camera_ok = true;
        while link.wait(interval) {
            let image = match frames.grab() {
                Ok(image) => {
                    if !camera_ok {
                        info!("gesture: camera back");
                        camera_ok = true;
                        link.notify(SourceNotice::CameraRestored);
                    }
                    image
                }
                Err(e) => {
                    warn!("gesture: frame grab failed: {}", e);
                    if camera_ok {
                        camera_ok = false;
                        link.notify(SourceNotice::CameraUnavailable(e.to_string()));
                    }
                    continue;
                }
            };

            let frame = match encode_frame(&image, format) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("gesture: frame encoding failed: {}", e);
                    continue;
                }
            };

            link.set_processing(true);
            let reading = classify_or_neutral(&mut classifier, &frame);
            link.set_processing(false);

            if !link.publish(reading.state) { break; }
            link.notify(SourceNotice::Classified(reading));
        }
        debug!("gesture: camera source finished");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_vision::{EncodedFrame, FixedClassifier, VisionError};
    use image::DynamicImage;

    const TICK: Duration = Duration::from_millis(5);

    /// Poll `cond` for up to two seconds.
    fn eventually(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() { return true; }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    struct Blank;

    impl FrameSource for Blank {
        fn grab(&mut self) -> gesture_vision::Result<DynamicImage> {
            Ok(DynamicImage::new_rgb8(32, 24))
        }
    }

    struct NoCamera;

    impl FrameSource for NoCamera {
        fn grab(&mut self) -> gesture_vision::Result<DynamicImage> {
            Err(VisionError::Camera("permission denied".into()))
        }
    }

    struct Slow(Duration);

    impl GestureClassifier for Slow {
        fn classify(&mut self, _frame: &EncodedFrame) -> gesture_vision::Result<GestureReading> {
            thread::sleep(self.0);
            Ok(GestureReading::new(GestureState::Open, 0.9))
        }
    }

    #[test]
    fn sim_keys_drive_the_cell() {
        let cell = GestureCell::default();
        let (tx, rx) = mpsc::channel();
        let task = spawn_gesture_source(SimGestureSource { rx }, cell.clone());

        tx.send(SimInput::KeyDown(SimKey::ClosedHand)).unwrap();
        assert!(eventually(|| cell.load() == GestureState::Closed));
        tx.send(SimInput::KeyDown(SimKey::OpenHand)).unwrap();
        assert!(eventually(|| cell.load() == GestureState::Open));

        drop(tx);
        assert!(eventually(|| !task.is_running()));
    }

    #[test]
    fn camera_source_publishes_readings() {
        let cell = GestureCell::default();
        let source = CameraGestureSource::new(Blank, FixedClassifier::open_hand()).interval(TICK);
        let task = spawn_gesture_source(source, cell.clone());

        assert!(eventually(|| cell.load() == GestureState::Open));
        let mut notices = Vec::new();
        assert!(eventually(|| {
            notices.extend(task.drain_notices());
            !notices.is_empty()
        }));
        assert!(matches!(notices[0], SourceNotice::Classified(r) if r.state == GestureState::Open));
    }

    #[test]
    fn camera_failure_is_reported_once_and_state_kept() {
        let cell = GestureCell::new(GestureState::Closed);
        let source = CameraGestureSource::new(NoCamera, FixedClassifier::open_hand()).interval(TICK);
        let task = spawn_gesture_source(source, cell.clone());

        let mut notices = Vec::new();
        assert!(eventually(|| {
            notices.extend(task.drain_notices());
            !notices.is_empty()
        }));
        thread::sleep(TICK * 10);
        notices.extend(task.drain_notices());

        assert_eq!(notices.len(), 1);
        assert!(matches!(&notices[0], SourceNotice::CameraUnavailable(msg) if msg.contains("permission")));
        assert_eq!(cell.load(), GestureState::Closed);
    }

    #[test]
    fn late_result_after_cancel_is_discarded() {
        let cell = GestureCell::default();
        let source = CameraGestureSource::new(Blank, Slow(Duration::from_millis(150))).interval(TICK);
        let mut task = spawn_gesture_source(source, cell.clone());

        assert!(eventually(|| task.is_processing()));
        task.stop();
        thread::sleep(Duration::from_millis(300));

        assert_eq!(cell.load(), GestureState::NoHand);
    }

    #[test]
    fn drop_cancels_polling() {
        let cell = GestureCell::default();
        let source = CameraGestureSource::new(Blank, FixedClassifier::open_hand())
            .interval(Duration::from_secs(60));
        let task = spawn_gesture_source(source, cell.clone());
        drop(task);
        thread::sleep(STOP_CHECK * 3);
        assert_eq!(cell.load(), GestureState::NoHand);
    }
}
