use std::fmt::{Debug, Formatter};

use dark_std::sync::SyncVec;
use log::LevelFilter;

use crate::appender::LogSink;
use crate::consts;
use crate::filter::{Filter, NoFilter};
use crate::plugin::console::ConsoleSink;
use crate::plugin::file_rotate::{RotateConfig, RotateFileSink};
use crate::plugin::socket::SocketSink;

/// the roto_log Config
/// for example:
// roto_log::init(
//     Config::new().console().file_rotate(RotateConfig::new("app.log"))
// )
pub struct Config {
    /// Each sink owns its queue and worker
    pub sinks: SyncVec<Box<dyn LogSink>>,
    /// the log level filter
    pub level: LevelFilter,
    /// drops records before fan-out
    pub filter: Box<dyn Filter>,
    /// queue bound for sinks added after it is set
    pub chan_len: usize,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("sinks", &self.sinks.len())
            .field("level", &self.level)
            .field("chan_len", &self.chan_len)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sinks: SyncVec::new(),
            level: LevelFilter::Trace,
            filter: Box::new(NoFilter {}),
            chan_len: consts::DEFAULT_CHAN_LEN,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// set log LevelFilter
    pub fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// set log Filter
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filter = Box::new(filter);
        self
    }

    /// queue bound for every sink added after this call
    pub fn chan_len(mut self, len: usize) -> Self {
        self.chan_len = len;
        self
    }

    /// add a ConsoleSink
    pub fn console(self) -> Self {
        let sink = ConsoleSink::new(self.chan_len);
        self.sinks.push(Box::new(sink));
        self
    }

    /// add a RotateFileSink
    pub fn file_rotate(self, config: RotateConfig) -> Self {
        let sink = RotateFileSink::new(config, self.chan_len);
        self.sinks.push(Box::new(sink));
        self
    }

    /// add a SocketSink; a failed connection is reported and skipped
    pub fn socket(self, addr: &str) -> Self {
        match SocketSink::connect(addr, self.chan_len) {
            Ok(sink) => {
                self.sinks.push(Box::new(sink));
            }
            Err(e) => eprintln!("SocketSink({:?}): {}", addr, e),
        }
        self
    }

    /// add a custom LogSink
    pub fn add_sink<S: LogSink + 'static>(self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}
