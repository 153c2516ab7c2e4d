use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// In-memory sink for everything the tool logs during a run.
///
/// The captured buffer is uploaded at the end of the run as its own
/// diagnostic artifact, so support sees exactly what the user saw. The tool
/// is one-shot and the buffer stays small, so there is no rotation.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self
            .buffer
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Setup logging with an in-memory capture layer and optional console echo.
///
/// # Arguments
/// * `verbose` - If true, use debug level; otherwise use info level
/// * `console` - If true, also log to the console (suppressed in silent mode)
/// * `ansi` - If true, the console layer uses ANSI colors
///
/// # Returns
/// The capture handle; its contents are uploaded at the end of the run
pub fn setup_logging(verbose: bool, console: bool, ansi: bool) -> LogCapture {
    let capture = LogCapture::new();

    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // The capture layer never carries ANSI codes; the sanitizer strips
    // console noise anyway, but there is no reason to produce it.
    let capture_layer = tracing_subscriber::fmt::layer()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_target(false);

    if console {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_target(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(capture_layer)
            .with(console_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(capture_layer)
            .init();
    }

    capture
}
