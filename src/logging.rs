//! Tracing subscriber setup.
//!
//! `DOCVERIFY_LOG_UNBUFFERED` selects a stdout writer flushed after every
//! event (containers, log shippers). Without it events go through a
//! non-blocking buffered writer. `DOCVERIFY_LOG_FORMAT=json` switches to
//! JSON lines.

use std::io::{self, Write};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const UNBUFFERED_ENV: &str = "DOCVERIFY_LOG_UNBUFFERED";
pub const FORMAT_ENV: &str = "DOCVERIFY_LOG_FORMAT";

/// How log events reach stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Written and flushed per event.
    Unbuffered,
    /// Handed to a background writer thread.
    Buffered,
}

impl LogOutput {
    pub fn from_flag(value: Option<&str>) -> Self {
        if flag_enabled(value) {
            Self::Unbuffered
        } else {
            Self::Buffered
        }
    }

    pub fn from_env() -> Self {
        Self::from_flag(std::env::var(UNBUFFERED_ENV).ok().as_deref())
    }
}

/// Boolean-style environment value: `1`, `true`, `yes` or `on`.
pub fn flag_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn json_from_env() -> bool {
    std::env::var(FORMAT_ENV).is_ok_and(|f| f.eq_ignore_ascii_case("json"))
}

/// Writer that flushes the inner writer after every write.
#[derive(Debug)]
pub struct FlushEach<W>(pub W);

impl<W: Write> Write for FlushEach<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.0.write(buf)?;
        self.0.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(writer: W, json: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if json {
        Box::new(fmt::layer::<Registry>().json().with_writer(writer))
    } else {
        Box::new(fmt::layer::<Registry>().with_writer(writer))
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the buffered writer when dropped and must be
/// held until the process exits.
pub fn init(default_filter: &str) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json = json_from_env();

    let (layer, guard) = match LogOutput::from_env() {
        LogOutput::Unbuffered => (fmt_layer(|| FlushEach(io::stdout()), json), None),
        LogOutput::Buffered => {
            let (writer, guard) = tracing_appender::non_blocking(io::stdout());
            (fmt_layer(writer, json), Some(guard))
        }
    };

    tracing_subscriber::registry().with(layer).with(filter).init();
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_flag_values() {
        for on in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(flag_enabled(Some(on)), "{:?}", on);
        }
        for off in ["0", "false", "", "no"] {
            assert!(!flag_enabled(Some(off)), "{:?}", off);
        }
        assert!(!flag_enabled(None));
    }

    #[test]
    fn test_output_from_flag() {
        assert_eq!(LogOutput::from_flag(Some("1")), LogOutput::Unbuffered);
        assert_eq!(LogOutput::from_flag(Some("0")), LogOutput::Buffered);
        assert_eq!(LogOutput::from_flag(None), LogOutput::Buffered);
    }

    #[test]
    fn test_flush_each_write() {
        let mut writer = FlushEach(Recorder::default());
        writer.write_all(b"first event\n").unwrap();
        writer.write_all(b"second event\n").unwrap();

        assert_eq!(writer.0.data, b"first event\nsecond event\n");
        assert_eq!(writer.0.flushes, 2);
    }
}
