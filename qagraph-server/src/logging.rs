//! Tracing setup: stdout always, plus an ANSI-free file when `LOG_FILE` is set.

use std::io::{self, Write};

/// Writer that strips ANSI escape sequences (e.g. `ESC [ 0 m`) so file logs are plain text.
pub struct StripAnsiWriter<W> {
    inner: W,
    /// Pending escape sequence: ESC, or ESC [ ... until the final byte.
    pending: Vec<u8>,
}

impl<W: Write> StripAnsiWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::with_capacity(16),
        }
    }

    fn is_csi_parameter(b: u8) -> bool {
        matches!(b, b'[' | b'?' | b';' | b':' | b'0'..=b'9')
    }

    fn is_csi_final(b: u8) -> bool {
        (0x40..=0x7e).contains(&b)
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.pending)?;
        self.pending.clear();
        Ok(())
    }
}

impl<W: Write> Write for StripAnsiWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut rest = buf;
        while let Some((&b, tail)) = rest.split_first() {
            match self.pending.len() {
                0 => match rest.iter().position(|&c| c == 0x1b) {
                    Some(i) => {
                        self.inner.write_all(&rest[..i])?;
                        self.pending.push(0x1b);
                        rest = &rest[i + 1..];
                        continue;
                    }
                    None => {
                        self.inner.write_all(rest)?;
                        break;
                    }
                },
                1 => {
                    self.pending.push(b);
                    if b != b'[' {
                        self.flush_pending()?;
                    }
                }
                _ if Self::is_csi_final(b) && b != b'[' => self.pending.clear(),
                _ if Self::is_csi_parameter(b) => {
                    self.pending.push(b);
                    if self.pending.len() > 64 {
                        self.flush_pending()?;
                    }
                }
                _ => {
                    self.flush_pending()?;
                    self.inner.write_all(&[b])?;
                }
            }
            rest = tail;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.flush_pending()?;
        }
        self.inner.flush()
    }
}

/// Initializes tracing from `RUST_LOG` (default `info,qagraph_server=debug,qagraph=info`).
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,qagraph_server=debug,qagraph=info")
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter.clone());
    let registry = tracing_subscriber::registry().with(stdout_layer);

    match std::env::var("LOG_FILE") {
        Ok(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(StripAnsiWriter::new(file)))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_filter(filter);
            registry.with(file_layer).init();
            tracing::info!(path = %path, "logging to file");
        }
        Err(_) => registry.init(),
    }
    Ok(())
}
