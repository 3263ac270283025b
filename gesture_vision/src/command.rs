//! Classifier backed by an external program.
//!
//! The program receives a [`ClassifyRequest`] as JSON on stdin and must
//! print a `{state, confidence}` object on stdout.  This keeps the actual
//! vision model (a hosted API, a local network, a script) outside the
//! process.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::classify::{parse_reading, ClassifyRequest, GestureClassifier, GestureReading};
use crate::error::{Result, VisionError};
use crate::frame::EncodedFrame;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `program args…` once per frame.
#[derive(Clone, Debug)]
pub struct CommandClassifier {
    program: String,
    args:    Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    pub fn new(program: impl Into<String>) -> Self {
        CommandClassifier {
            program: program.into(),
            args:    Vec::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Kill the program if it has not answered within `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl GestureClassifier for CommandClassifier {
    fn classify(&mut self, frame: &EncodedFrame) -> Result<GestureReading> {
        let request = serde_json::to_vec(&ClassifyRequest::new(frame))?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| VisionError::Classifier(format!("cannot start {}: {}", self.program, e)))?;

        let outcome = self.exchange(&mut child, request);
        if outcome.is_err() {
            // Every failure after spawn ends here, so the child is always reaped.
            let _ = child.kill();
            let _ = child.wait();
        }
        outcome
    }
}

impl CommandClassifier {
    fn exchange(&self, child: &mut Child, request: Vec<u8>) -> Result<GestureReading> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VisionError::Classifier("stdin not captured".into()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| VisionError::Classifier("stdout not captured".into()))?;

        // Both pipes are serviced on the side so a child that stalls on
        // either of them is still caught by the deadline.
        let writer = thread::spawn(move || feed(stdin, &request));
        let reader = thread::spawn(move || {
            let mut text = String::new();
            stdout.read_to_string(&mut text).map(|_| text)
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                return Err(VisionError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        writer
            .join()
            .map_err(|_| VisionError::Classifier("stdin writer panicked".into()))??;
        if !status.success() {
            return Err(VisionError::Classifier(format!("{} exited with {}", self.program, status)));
        }

        let text = reader
            .join()
            .map_err(|_| VisionError::Classifier("stdout reader panicked".into()))??;
        trace!("classifier said: {}", text.trim());
        parse_reading(&text)
    }
}

/// Write the request and close stdin.  A program that exits without
/// reading its input is judged by its exit status and output, not by the
/// broken pipe.
fn feed(mut stdin: ChildStdin, request: &[u8]) -> io::Result<()> {
    match stdin.write_all(request) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("classifier closed stdin after {} request bytes were queued", request.len());
            Ok(())
        }
        other => other,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::classify::classify_or_neutral;
    use morph_field::GestureState;

    fn frame() -> EncodedFrame {
        EncodedFrame { width: 320, height: 240, data: "QUJD".into() }
    }

    fn shell(script: &str) -> CommandClassifier {
        CommandClassifier::new("sh").args(["-c", script])
    }

    #[test]
    fn reads_reading_from_stdout() {
        let mut c = shell(r#"cat > /dev/null; echo '{"state":"open","confidence":0.9}'"#);
        let r = c.classify(&frame()).unwrap();
        assert_eq!(r.state, GestureState::Open);
        assert!((r.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn request_arrives_on_stdin() {
        // Echo "closed" only if the payload made it through.
        let mut c = shell(
            r#"if grep -q '"data":"QUJD"'; then echo '{"state":"closed","confidence":1}'; else echo '{"state":"none","confidence":0}'; fi"#,
        );
        assert_eq!(c.classify(&frame()).unwrap().state, GestureState::Closed);
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let mut c = shell("cat > /dev/null; exit 3");
        assert!(matches!(c.classify(&frame()), Err(VisionError::Classifier(_))));
    }

    #[test]
    fn slow_classifier_times_out() {
        let mut c = shell("cat > /dev/null; sleep 5").timeout(Duration::from_millis(100));
        assert!(matches!(c.classify(&frame()), Err(VisionError::Timeout(_))));
    }

    #[test]
    fn program_ignoring_a_large_request_is_judged_by_its_output() {
        // Far more than a pipe buffer, and the program never reads it.
        let big = EncodedFrame { width: 320, height: 240, data: "A".repeat(1 << 20) };
        let mut silent = shell("exit 0");
        assert!(matches!(silent.classify(&big), Err(VisionError::Json(_))));

        let mut answers = shell(r#"echo '{"state":"open","confidence":0.5}'"#);
        assert_eq!(answers.classify(&big).unwrap().state, GestureState::Open);
    }

    #[test]
    fn missing_program_degrades_to_neutral() {
        let mut c = CommandClassifier::new("/nonexistent/gesture-classifier");
        assert_eq!(classify_or_neutral(&mut c, &frame()), GestureReading::NEUTRAL);
    }
}
