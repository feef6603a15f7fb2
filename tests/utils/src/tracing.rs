use std::{
    io,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// Cloneable in-memory sink, used both for captured stdout and captured logs.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn buf(&self) -> io::Result<MutexGuard<'_, Vec<u8>>> {
        self.buf
            .lock()
            .map_err(|_| io::Error::from(io::ErrorKind::Other))
    }

    pub fn contents(&self) -> String {
        self.buf()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut b) = self.buf() {
            b.clear();
        }
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.buf()?.flush()
    }
}

impl<'a> MakeWriter<'a> for SharedBuffer {
    type Writer = SharedBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Collects everything a test emits through `tracing`.
///
/// ```ignore
/// let logs = LogCapture::new();
/// tracing::subscriber::with_default(logs.subscriber(), || do_work());
/// assert!(logs.contains("expected warning"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    sink: SharedBuffer,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.sink.clone())
            .with_ansi(false)
            .with_max_level(Level::TRACE)
            .finish()
    }

    // substring match per line, so keep needles specific to the test
    pub fn contains(&self, s: &str) -> bool {
        self.sink.contents().lines().any(|line| line.contains(s))
    }

    pub fn contents(&self) -> String {
        self.sink.contents()
    }
}
