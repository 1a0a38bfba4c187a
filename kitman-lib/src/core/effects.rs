//! Wrappers around user-facing side effects (progress display, output
//! streams). Scaled down from a multi-operation tree to the single
//! long-running step this crate has: generating a catalog.

use std::fmt::Write as FmtWrite;
use std::io::{stderr, stdout, Stderr, Stdout};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

/// Either Unicode glyphs or their plain-ASCII fallback, chosen once at
/// startup based on the output terminal's capabilities.
#[derive(Clone, Debug)]
pub struct Glyphs {
    unicode: bool,
}

impl Glyphs {
    /// Detect glyph support from `stdout`.
    pub fn detect() -> Self {
        Self {
            unicode: Term::stdout().features().wants_emoji(),
        }
    }

    /// Force the plain-ASCII fallback (used by tests and non-TTY output).
    pub fn text() -> Self {
        Self { unicode: false }
    }

    /// Force Unicode glyphs on, regardless of terminal detection.
    pub fn pretty() -> Self {
        Self { unicode: true }
    }

    /// A single checkmark-style glyph.
    pub fn check(&self) -> &'static str {
        if self.unicode {
            "✓"
        } else {
            "OK"
        }
    }

    /// A single cross-style glyph.
    pub fn cross(&self) -> &'static str {
        if self.unicode {
            "✗"
        } else {
            "X"
        }
    }
}

/// Which stream user-facing output should be written to.
#[derive(Clone, Copy, Debug)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

#[derive(Clone)]
enum Sink {
    Stdout(Arc<Mutex<Stdout>>),
    Stderr(Arc<Mutex<Stderr>>),
    Buffer(Arc<Mutex<String>>),
}

/// The side-effect handle threaded through catalog generation: where to
/// print, and how to report progress. Cloning is cheap; all clones share the
/// same underlying streams.
#[derive(Clone)]
pub struct Effects {
    glyphs: Glyphs,
    sink: Sink,
    suppress_progress: bool,
}

impl Effects {
    /// An effects handle that writes to `stdout` and shows progress.
    pub fn new(glyphs: Glyphs) -> Self {
        Self {
            glyphs,
            sink: Sink::Stdout(Arc::new(Mutex::new(stdout()))),
            suppress_progress: false,
        }
    }

    /// An effects handle with progress bars suppressed, for tests.
    pub fn new_suppress_for_test(glyphs: Glyphs) -> Self {
        Self {
            glyphs,
            sink: Sink::Buffer(Arc::new(Mutex::new(String::new()))),
            suppress_progress: true,
        }
    }

    /// The glyph set this handle was constructed with.
    pub fn get_glyphs(&self) -> &Glyphs {
        &self.glyphs
    }

    /// Write a line of user-facing status text to this handle's sink.
    pub fn print(&self, message: &str) {
        match &self.sink {
            Sink::Stdout(stream) => {
                use std::io::Write;
                let mut stream = stream.lock().expect("stdout mutex poisoned");
                let _ = writeln!(stream, "{message}");
            }
            Sink::Stderr(stream) => {
                use std::io::Write;
                let mut stream = stream.lock().expect("stderr mutex poisoned");
                let _ = writeln!(stream, "{message}");
            }
            Sink::Buffer(buffer) => {
                let mut buffer = buffer.lock().expect("buffer mutex poisoned");
                let _ = writeln!(buffer, "{message}");
            }
        }
    }

    /// Start a spinner for the single long-running step (loading the commit
    /// graph and walking it). Returns a handle whose `Drop` clears the
    /// spinner; callers report completion with [`ProgressHandle::finish`].
    pub fn start_operation(&self, label: impl Into<String>) -> ProgressHandle {
        let bar = if self.suppress_progress {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .expect("static template is valid"),
            );
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        bar.set_message(label.into());
        ProgressHandle {
            glyphs: self.glyphs.clone(),
            bar,
        }
    }
}

/// Handle for a single in-flight operation's progress display.
pub struct ProgressHandle {
    glyphs: Glyphs,
    bar: ProgressBar,
}

impl ProgressHandle {
    /// Mark the operation finished, replacing the spinner with a final
    /// status line.
    pub fn finish(self, message: &str) {
        let mut line = String::new();
        let _ = write!(line, "{} {message}", self.glyphs.check());
        self.bar.finish_with_message(line);
    }

    /// Mark the operation as having failed.
    pub fn finish_with_error(self, message: &str) {
        let mut line = String::new();
        let _ = write!(line, "{} {message}", self.glyphs.cross());
        self.bar.finish_with_message(line);
    }
}
