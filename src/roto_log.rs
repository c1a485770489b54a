use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use dark_std::sync::SyncVec;
use log::{LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::appender::{LogRecord, LogSink};
use crate::config::Config;
use crate::error::LogError;
use crate::filter::Filter;
use crate::runtime::WaitGroup;
use crate::wait::LogWaitGroup;

/// Registered sinks plus the record filter; installed once by [`init`],
/// removed by [`exit`].
struct Dispatcher {
    sinks: SyncVec<Box<dyn LogSink>>,
    filter: Box<dyn Filter>,
}

static DISPATCHER: Lazy<RwLock<Option<Dispatcher>>> = Lazy::new(|| RwLock::new(None));

pub struct Logger {
    level: AtomicUsize,
}

impl Logger {
    pub fn set_level(&self, level: LevelFilter) {
        self.level.store(level as usize, Ordering::Relaxed);
    }

    pub fn get_level(&self) -> LevelFilter {
        match self.level.load(Ordering::Relaxed) {
            0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            4 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.get_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let lock = DISPATCHER.read();
        let dispatcher = match lock.as_ref() {
            Some(v) => v,
            None => return,
        };
        if dispatcher
            .filter
            .filter(record.module_path().unwrap_or_default())
        {
            return;
        }
        let rec = LogRecord {
            level: record.level(),
            created: SystemTime::now(),
            source: format_source(record),
            message: record.args().to_string(),
        };
        for sink in dispatcher.sinks.iter() {
            sink.enqueue(rec.clone());
        }
    }

    fn flush(&self) {
        crate::roto_log::flush().wait();
    }
}

fn format_source(record: &Record) -> String {
    match (record.file(), record.line()) {
        (Some(file), Some(line)) => format!("{}:{}", file, line),
        _ => record.module_path().unwrap_or_default().to_string(),
    }
}

static LOGGER: Logger = Logger {
    level: AtomicUsize::new(LevelFilter::Trace as usize),
};

/// Install the global logger. Every sink configured in `config` already has
/// its worker running; this wires the `log` macros to them.
pub fn init(config: Config) -> Result<(), LogError> {
    let Config {
        sinks,
        level,
        filter,
        chan_len: _,
    } = config;
    {
        let mut w = DISPATCHER.write();
        if w.is_some() {
            return Err(LogError::from("roto_log already initialized"));
        }
        *w = Some(Dispatcher { sinks, filter });
    }
    LOGGER.set_level(level);
    if let Err(e) = log::set_logger(&LOGGER) {
        if let Some(dispatcher) = DISPATCHER.write().take() {
            shutdown(&dispatcher);
        }
        return Err(LogError::from(e));
    }
    log::set_max_level(level);
    Ok(())
}

/// Broadcast a flush barrier to every sink. `wait()` on the returned handle
/// blocks until all workers have flushed their buffers.
pub fn flush() -> LogWaitGroup {
    let wg = WaitGroup::new();
    let lock = DISPATCHER.read();
    if let Some(dispatcher) = lock.as_ref() {
        for sink in dispatcher.sinks.iter() {
            sink.flush_sync(wg.clone());
        }
    }
    drop(lock);
    LogWaitGroup::new(wg)
}

/// Close every sink's queue and block until each worker has written its
/// trailer and exited. Records logged afterwards are discarded at the front
/// door.
pub fn exit() {
    let dispatcher = DISPATCHER.write().take();
    if let Some(dispatcher) = dispatcher {
        shutdown(&dispatcher);
    }
}

fn shutdown(dispatcher: &Dispatcher) {
    for sink in dispatcher.sinks.iter() {
        sink.close();
    }
    for sink in dispatcher.sinks.iter() {
        sink.wait();
    }
}
