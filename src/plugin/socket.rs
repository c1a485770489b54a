//! Sink shipping each record to a TCP peer as one JSON object. Closing the
//! queue tears the connection down.

use std::io::Write;

use fastdate::DateTime;
use parking_lot::Mutex;

use crate::appender::{Command, LogRecord, LogSink};
use crate::error::LogError;
use crate::runtime::{chan, spawn, JoinHandle, Receiver, Sender, TcpStream, WaitGroup};

pub struct SocketSink {
    sender: Sender<Command>,
    addr: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SocketSink {
    pub fn connect(addr: &str, chan_len: usize) -> Result<SocketSink, LogError> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| LogError::E(format!("connect {:?}: {}", addr, e)))?;
        let (sender, receiver) = chan(chan_len);
        let peer = addr.to_string();
        let handle = spawn(move || socket_loop(stream, peer, receiver));
        Ok(Self {
            sender,
            addr: addr.to_string(),
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl LogSink for SocketSink {
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

fn socket_loop(mut stream: TcpStream, peer: String, receiver: Receiver<Command>) {
    for msg in receiver {
        match msg {
            Command::CommandRecord(record) => {
                let payload = record_payload(&record).to_string();
                if let Err(e) = stream.write_all(payload.as_bytes()) {
                    eprintln!("SocketSink({:?}): {}", peer, e);
                    return;
                }
            }
            Command::CommandFlush(wg) => {
                let _ = stream.flush();
                drop(wg);
            }
            Command::CommandExit => break,
        }
    }
    // dropping the stream closes the connection
}

fn record_payload(record: &LogRecord) -> serde_json::Value {
    let created = DateTime::from_system_time(record.created, fastdate::offset_sec());
    serde_json::json!({
        "level": record.level.as_str(),
        "created": created.to_string(),
        "source": record.source,
        "message": record.message,
    })
}
