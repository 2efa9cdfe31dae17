//! Log subscriber setup. Records go to stderr and, once a path is set, are
//! mirrored into a log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

type FileSlot = Arc<RwLock<Option<File>>>;

#[derive(Clone)]
struct LogSink {
    file: FileSlot,
}

struct TeeWriter {
    file: FileSlot,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogSink {
    type Writer = TeeWriter;

    fn make_writer(&'a self) -> Self::Writer {
        TeeWriter {
            file: self.file.clone(),
        }
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = io::stderr().write(buf)?;
        if let Ok(mut slot) = self.file.write() {
            if let Some(file) = slot.as_mut() {
                let _ = file.write_all(&buf[..written]);
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Ok(mut slot) = self.file.write() {
            if let Some(file) = slot.as_mut() {
                let _ = file.flush();
            }
        }
        Ok(())
    }
}

static SINK: OnceLock<LogSink> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG` wins over the `info` default.
/// Safe to call more than once.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let sink = SINK
        .get_or_init(|| LogSink {
            file: Arc::new(RwLock::new(None)),
        })
        .clone();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(sink)
        .try_init();
}

/// Starts (or stops, with `None`) mirroring log output to `log_file`.
pub fn set_log_file(log_file: Option<&Path>) -> io::Result<()> {
    let Some(sink) = SINK.get() else {
        return Ok(());
    };

    let file = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Some(OpenOptions::new().create(true).append(true).open(path)?)
        }
        None => None,
    };

    match sink.file.write() {
        Ok(mut slot) => *slot = file,
        Err(poisoned) => *poisoned.into_inner() = file,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn mirrors_records_into_log_file() {
        init();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("fintrack.log");

        set_log_file(Some(&path)).unwrap();
        log::warn!("mirrored line for the log file test");
        set_log_file(None).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("mirrored line for the log file test"));
    }
}
