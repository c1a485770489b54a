//! Pass-through sink printing each record to standard output on its own
//! worker thread.

use std::io::Write;
use std::time::UNIX_EPOCH;

use fastdate::DateTime;
use parking_lot::Mutex;

use crate::appender::{Command, LogRecord, LogSink};
use crate::runtime::{chan, spawn, JoinHandle, Receiver, Sender, WaitGroup};

pub struct ConsoleSink {
    sender: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleSink {
    pub fn new(chan_len: usize) -> ConsoleSink {
        let (sender, receiver) = chan(chan_len);
        let handle = spawn(move || console_loop(receiver));
        Self {
            sender,
            worker: Mutex::new(Some(handle)),
        }
    }
}

impl LogSink for ConsoleSink {
    fn enqueue(&self, record: LogRecord) {
        let _ = self.sender.send(Command::CommandRecord(record));
    }

    fn close(&self) {
        let _ = self.sender.send(Command::CommandExit);
    }

    fn wait(&self) {
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    fn flush_sync(&self, wg: WaitGroup) {
        let _ = self.sender.send(Command::CommandFlush(wg));
    }
}

fn console_loop(receiver: Receiver<Command>) {
    let stdout = std::io::stdout();
    // records inside the same second reuse the rendered timestamp
    let mut timestr = String::new();
    let mut timestr_at = u64::MAX;
    for msg in receiver {
        match msg {
            Command::CommandRecord(record) => {
                let at = record
                    .created
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                if at != timestr_at {
                    let dt = DateTime::from_system_time(record.created, fastdate::offset_sec());
                    timestr = dt.format("MM/DD/YYYY hh:mm:ss");
                    timestr_at = at;
                }
                let mut out = stdout.lock();
                let _ = writeln!(
                    out,
                    "[{}] [{}] {}",
                    timestr,
                    record.level.as_str(),
                    record.message
                );
            }
            Command::CommandFlush(wg) => {
                let _ = stdout.lock().flush();
                drop(wg);
            }
            Command::CommandExit => break,
        }
    }
}
