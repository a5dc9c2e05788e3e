//! Tracing setup with redacted output.

use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use super::redact::Redactor;

/// Initialises the global subscriber, writing redacted lines to stderr.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init(redactor: Redactor, default_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(RedactingMakeWriter::new(io::stderr, redactor))
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

/// [`MakeWriter`] that redacts each formatted event before it reaches `inner`.
pub struct RedactingMakeWriter<M> {
    inner: M,
    redactor: Redactor,
}

impl<M> RedactingMakeWriter<M> {
    /// Wraps `inner`.
    pub fn new(inner: M, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<'a, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            redactor: &self.redactor,
            buffer: Vec::new(),
            inner: self.inner.make_writer(),
        }
    }
}

/// Buffers one event and writes it redacted on flush or drop.
pub struct RedactingWriter<'a, W: Write> {
    redactor: &'a Redactor,
    buffer: Vec<u8>,
    inner: W,
}

impl<W: Write> RedactingWriter<'_, W> {
    fn flush_buffer(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let text = String::from_utf8_lossy(&self.buffer);
        let redacted = self.redactor.redact(&text);
        self.buffer.clear();
        self.inner.write_all(redacted.as_bytes())?;
        self.inner.flush()
    }
}

impl<W: Write> Write for RedactingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()
    }
}

impl<W: Write> Drop for RedactingWriter<'_, W> {
    fn drop(&mut self) {
        let _ = self.flush_buffer();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory log sink shared between a subscriber and the test.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        /// Everything written so far.
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_lines_are_redacted() {
        let sink = SharedBuffer::default();
        let handle = sink.clone();
        let redactor = Redactor::new([("GH_TOKEN", Some("ghp_topsecret".to_string()))]);

        let subscriber = tracing_subscriber::fmt()
            .with_writer(RedactingMakeWriter::new(move || sink.clone(), redactor))
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(url = "https://ghp_topsecret@github.com", "push failed");
        });

        let output = handle.contents();
        assert!(output.contains("push failed"));
        assert!(output.contains("${GH_TOKEN}"));
        assert!(!output.contains("ghp_topsecret"));
    }
}
