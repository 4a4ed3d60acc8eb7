//! Panic-hook stack capture
//!
//! [`PanicCapture`] is the native implementation of the [`IStackCapture`]
//! port. It turns panics (when uncaught-error collection is enabled) and
//! explicitly reported errors into [`RawError`]s built from
//! [`std::backtrace::Backtrace`], then dispatches them to subscribers.
//!
//! Backtraces list the innermost call first; frames are reversed so that
//! subscribers receive them oldest call first, as the port specifies. When
//! source fetching is enabled, each frame gets the lines of its source file
//! surrounding the reported line.

use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use enlight_core::domain::{ErrorMode, RawError, RawFrame};
use enlight_core::ports::{CaptureOptions, ErrorHandler, Exception, IStackCapture};
use tracing::{debug, info};

/// Leading backtrace frames belonging to the capture machinery itself
const INTERNAL_FRAME_PREFIXES: &[&str] = &[
    "std::backtrace",
    "std::panicking",
    "std::panic",
    "std::sys",
    "core::panicking",
    "rust_begin_unwind",
    "__rustc::rust_begin_unwind",
    "enlight_agent::capture",
    "<alloc::boxed::Box<F,A> as core::ops::function::Fn",
];

/// Error name used for explicitly reported errors
const REPORTED_ERROR_NAME: &str = "Error";

/// Error name used for panics
const PANIC_ERROR_NAME: &str = "panic";

/// Stack capture backed by `std::backtrace` and the process panic hook
#[derive(Clone, Default)]
pub struct PanicCapture {
    inner: Arc<CaptureInner>,
}

#[derive(Default)]
struct CaptureInner {
    handlers: RwLock<Vec<ErrorHandler>>,
    options: RwLock<CaptureOptions>,
    hook_installed: AtomicBool,
}

impl PanicCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pass-through options
    pub fn options(&self) -> CaptureOptions {
        *self
            .inner
            .options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of registered subscribers
    pub fn handler_count(&self) -> usize {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Installs the panic hook once per capture instance
    ///
    /// The previous hook is chained and still runs after dispatch. Panics
    /// are only dispatched while `collect_uncaught` is enabled.
    pub fn install(&self) {
        if self.inner.hook_installed.swap(true, Ordering::AcqRel) {
            return;
        }

        let weak: Weak<CaptureInner> = Arc::downgrade(&self.inner);
        let previous_hook = panic::take_hook();

        panic::set_hook(Box::new(move |panic_info| {
            if let Some(inner) = weak.upgrade() {
                let capture = PanicCapture { inner };
                if capture.options().collect_uncaught {
                    let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };

                    let location = panic_info
                        .location()
                        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

                    capture.capture_panic(&message, location.as_deref());
                }
            }

            previous_hook(panic_info);
        }));

        info!("Panic capture hook installed");
    }

    /// Builds and dispatches a report for a panic
    fn capture_panic(&self, message: &str, location: Option<&str>) {
        let message = match location {
            Some(location) => format!("{message} at {location}"),
            None => message.to_string(),
        };
        let raw = RawError::new(PANIC_ERROR_NAME, message).with_stack(self.current_stack());
        self.dispatch(raw);
    }

    /// Captures the caller's stack, oldest call first
    pub fn current_stack(&self) -> Vec<RawFrame> {
        let backtrace = Backtrace::force_capture().to_string();
        let mut frames = parse_backtrace(&backtrace);
        frames.reverse();

        let options = self.options();
        if options.source_fetching && options.context_lines > 0 {
            attach_source_context(&mut frames, options.context_lines as usize);
        }
        frames
    }

    fn dispatch(&self, raw: RawError) {
        let handlers: Vec<ErrorHandler> = self
            .inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        debug!(handlers = handlers.len(), frames = raw.stack.len(), "Dispatching captured error");

        for handler in handlers {
            let raw = raw.clone();
            // a subscriber panicking inside the panic hook would abort the process
            if panic::catch_unwind(AssertUnwindSafe(|| handler(raw))).is_err() {
                debug!("Error subscriber panicked");
            }
        }
    }
}

impl IStackCapture for PanicCapture {
    fn configure(&self, options: &CaptureOptions) {
        *self
            .inner
            .options
            .write()
            .unwrap_or_else(PoisonError::into_inner) = *options;

        if options.collect_uncaught {
            self.install();
        }
    }

    fn on_error(&self, handler: ErrorHandler) {
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    /// Dispatches `exception`, then rethrows it
    fn report(&self, exception: Exception) -> Result<(), Exception> {
        let mut message = exception.to_string();
        let mut source = exception.source();
        while let Some(cause) = source {
            message.push_str("\ncaused by: ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        let raw = RawError::new(REPORTED_ERROR_NAME, message)
            .with_mode(ErrorMode::Stack)
            .with_stack(self.current_stack());
        self.dispatch(raw);

        Err(exception)
    }
}

/// Parses `Backtrace` display output into frames, innermost first
///
/// The format is a numbered function line optionally followed by an
/// indented `at file:line:column` line:
///
/// ```text
///    4: app::checkout::pay
///              at ./src/checkout.rs:42:9
/// ```
fn parse_backtrace(text: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                let (file, line_no) = split_location(location);
                frame.url = file.to_string();
                frame.line = line_no;
            }
        } else if let Some((index, function)) = trimmed.split_once(": ") {
            if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
                frames.push(RawFrame {
                    url: String::new(),
                    function: function.trim().to_string(),
                    line: None,
                    context: None,
                });
            }
        }
    }

    let skip = frames
        .iter()
        .take_while(|frame| {
            INTERNAL_FRAME_PREFIXES
                .iter()
                .any(|prefix| frame.function.starts_with(prefix))
        })
        .count();
    frames.split_off(skip)
}

/// Splits `file:line:column` (file may itself contain colons)
fn split_location(location: &str) -> (&str, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let column = parts.next();
    let line = parts.next();
    let file = parts.next();

    match (file, line, column) {
        (Some(file), Some(line), Some(_)) => (file, line.parse().ok()),
        _ => (location, None),
    }
}

/// Fills `context` with up to `lines` source lines centred on each frame's line
fn attach_source_context(frames: &mut [RawFrame], lines: usize) {
    let mut sources: HashMap<String, Option<Vec<String>>> = HashMap::new();

    for frame in frames.iter_mut() {
        let Some(line_no) = frame.line else { continue };
        if frame.url.is_empty() {
            continue;
        }

        let source = sources
            .entry(frame.url.clone())
            .or_insert_with(|| read_source(Path::new(&frame.url)));

        if let Some(source) = source {
            let window = context_window(source, line_no as usize, lines);
            if !window.is_empty() {
                *frame = frame.clone().with_context(window.iter().map(String::as_str));
            }
        }
    }
}

fn read_source(path: &Path) -> Option<Vec<String>> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| content.lines().map(str::to_string).collect())
}

/// `count` lines around 1-based `line`, clamped to the file
fn context_window(source: &[String], line: usize, count: usize) -> &[String] {
    if line == 0 || line > source.len() {
        return &[];
    }
    let start = (line - 1).saturating_sub(count / 2);
    let end = (start + count).min(source.len());
    &source[start..end]
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use super::*;

    const SAMPLE_BACKTRACE: &str = "   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:312:13
   1: enlight_agent::capture::PanicCapture::current_stack
             at ./crates/enlight-agent/src/capture.rs:120:25
   2: shop::checkout::pay
             at ./src/checkout.rs:42:9
   3: shop::main
             at ./src/main.rs:7:5
   4: core::ops::function::FnOnce::call_once
";

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "payment gateway unreachable")
        }
    }

    impl std::error::Error for Boom {}

    fn recording(capture: &PanicCapture) -> Arc<Mutex<Vec<RawError>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        capture.on_error(Arc::new(move |raw: RawError| sink.lock().unwrap().push(raw)));
        seen
    }

    #[test]
    fn test_parse_backtrace_skips_internal_frames() {
        let frames = parse_backtrace(SAMPLE_BACKTRACE);

        let names: Vec<&str> = frames.iter().map(|f| f.function.as_str()).collect();
        assert_eq!(
            names,
            vec!["shop::checkout::pay", "shop::main", "core::ops::function::FnOnce::call_once"]
        );
        assert_eq!(frames[0].url, "./src/checkout.rs");
        assert_eq!(frames[0].line, Some(42));
        assert_eq!(frames[2].url, "");
        assert_eq!(frames[2].line, None);
    }

    #[test]
    fn test_split_location_handles_windows_paths() {
        assert_eq!(split_location("C:\\src\\main.rs:7:5"), ("C:\\src\\main.rs", Some(7)));
        assert_eq!(split_location("weird"), ("weird", None));
    }

    #[test]
    fn test_context_window_is_centred_and_clamped() {
        let source: Vec<String> = (1..=20).map(|i| format!("line {i}")).collect();

        let window = context_window(&source, 10, 5);
        assert_eq!(window.first().unwrap(), "line 8");
        assert_eq!(window.last().unwrap(), "line 12");

        let window = context_window(&source, 1, 5);
        assert_eq!(window.first().unwrap(), "line 1");
        assert_eq!(window.len(), 5);

        let window = context_window(&source, 20, 5);
        assert_eq!(window.last().unwrap(), "line 20");

        assert!(context_window(&source, 0, 5).is_empty());
        assert!(context_window(&source, 21, 5).is_empty());
    }

    #[test]
    fn test_attach_source_context_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 1..=10 {
            writeln!(file, "source {i}").unwrap();
        }
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        let mut frames = vec![
            RawFrame::new(path.clone(), "f", 5),
            RawFrame::new("/nonexistent/file.rs", "g", 3),
        ];
        attach_source_context(&mut frames, 3);

        assert_eq!(
            frames[0].context_lines().unwrap(),
            vec!["source 4", "source 5", "source 6"]
        );
        assert!(frames[1].context.is_none());
    }

    #[test]
    fn test_configure_stores_options() {
        let capture = PanicCapture::new();
        let options = CaptureOptions {
            collect_uncaught: false,
            source_fetching: false,
            context_lines: 4,
        };
        capture.configure(&options);
        assert_eq!(capture.options(), options);
    }

    #[test]
    fn test_report_dispatches_then_rethrows_same_exception() {
        let capture = PanicCapture::new();
        capture.configure(&CaptureOptions {
            collect_uncaught: false,
            source_fetching: false,
            context_lines: 0,
        });
        let seen = recording(&capture);

        let exception: Exception = Arc::new(Boom);
        let rethrown = capture.report(Arc::clone(&exception)).unwrap_err();

        assert!(Arc::ptr_eq(&rethrown, &exception));
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].name, "Error");
        assert_eq!(seen[0].message, "payment gateway unreachable");
        assert_eq!(seen[0].mode, ErrorMode::Stack);
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_dispatch() {
        let capture = PanicCapture::new();
        capture.on_error(Arc::new(|_: RawError| panic!("bad subscriber")));
        let seen = recording(&capture);

        capture.dispatch(RawError::new("E", "m"));
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(capture.handler_count(), 2);
    }

    #[test]
    fn test_panic_hook_dispatches_when_enabled() {
        let capture = PanicCapture::new();
        capture.configure(&CaptureOptions {
            collect_uncaught: true,
            source_fetching: false,
            context_lines: 0,
        });
        let seen = recording(&capture);

        let result = std::thread::spawn(|| panic!("cart total overflow")).join();
        assert!(result.is_err());

        let seen = seen.lock().unwrap();
        assert!(seen
            .iter()
            .any(|raw| raw.name == "panic" && raw.message.starts_with("cart total overflow")));
    }
}
