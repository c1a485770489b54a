//! Rotating file sink. One worker thread is the sole owner of the open file
//! handle and counters; the [`RotateFileSink`] handle reaches it only over
//! the record queue and a rendezvous rotation-signal channel.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::time::SystemTime;

use crossbeam::select;
use fastdate::DateTime;
use parking_lot::Mutex;

use crate::appender::{Command, LogRecord, LogSink, RecordFormat};
use crate::consts::LogSize;
use crate::error::LogError;
use crate::formats::{self, TemplateFormat};
use crate::plugin::rotation::{count_lines, shift_rotated_files};
use crate::runtime::{chan, spawn, JoinHandle, Receiver, Sender, WaitGroup};

const XML_RECORD_TEMPLATE: &str = "\t<record level=\"%L\">\n\t\t<timestamp>%D %T</timestamp>\n\t\t<source>%S</source>\n\t\t<message>%M</message>\n\t</record>";

/// Rotation policy and templates for one [`RotateFileSink`].
///
/// The sink consumes the config when its worker spawns, so every setting is
/// fixed before the first record is processed.
pub struct RotateConfig {
    pub filename: String,
    /// keep a numbered history on rotation; off means thresholds merely
    /// reopen the file and counters restart
    pub rotate: bool,
    /// rotate once this many lines are in the active file, 0 disables
    pub max_lines: usize,
    /// rotate once the active file holds this many bytes, 0 disables
    pub max_size: usize,
    /// rotate when the calendar day changes
    pub daily: bool,
    /// retained history files, 0 = unlimited, 1 = delete instead of keeping
    pub max_files: usize,
    /// record line template
    pub format: Box<dyn RecordFormat>,
    /// banner written after every open
    pub header: String,
    /// banner written before every close
    pub trailer: String,
}

impl RotateConfig {
    pub fn new(filename: &str) -> RotateConfig {
        Self {
            filename: filename.to_string(),
            rotate: true,
            max_lines: 0,
            max_size: 0,
            daily: false,
            max_files: 100,
            format: Box::new(TemplateFormat::default()),
            header: String::new(),
            trailer: String::new(),
        }
    }

    /// keep (true) or skip (false) the numbered history
    pub fn rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    /// rotate at line count
    pub fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = lines;
        self
    }

    /// rotate at file size
    pub fn max_size(mut self, size: LogSize) -> Self {
        self.max_size = size.get_len();
        self
    }

    /// rotate when the day of month changes
    pub fn daily(mut self, daily: bool) -> Self {
        self.daily = daily;
        self
    }

    /// retention cap, 0 = unlimited
    pub fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// record line template, see [`crate::formats`]
    pub fn format(mut self, template: &str) -> Self {
        self.format = Box::new(TemplateFormat::new(template));
        self
    }

    /// custom record format
    pub fn record_format<F: RecordFormat + 'static>(mut self, format: F) -> Self {
        self.format = Box::new(format);
        self
    }

    /// header and trailer banners; same mini-language, only `%D`/`%T` carry
    /// values
    pub fn head_foot(mut self, header: &str, trailer: &str) -> Self {
        self.header = header.to_string();
        self.trailer = trailer.to_string();
        self
    }

    /// XML records wrapped in a `<log>` document
    pub fn xml(self) -> Self {
        self.format(XML_RECORD_TEMPLATE)
            .head_foot("<log created=\"%D %T\">\n", "</log>\n")
    }
}

/// File sink with numbered rotation history (`app.log.0001`, ...).
pub struct RotateFileSink {
    sender: Sender<Command>,
    rot_sender: Sender<()>,
    filename: String,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RotateFileSink {
    /// Spawn the worker. It immediately performs a non-forced rotation
    /// evaluation: an existing file below its thresholds is resumed with its
    /// measured line and byte counts, anything over them is rotated away.
    pub fn new(config: RotateConfig, chan_len: usize) -> RotateFileSink {
        let filename = config.filename.clone();
        let (sender, receiver) = chan(chan_len);
        let (rot_sender, rot_receiver) = chan(0);
        let handle = spawn(move || worker_loop(config, receiver, rot_receiver));
        Self {
            sender,
            rot_sender,
            filename,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Force a rotation; blocks until the worker accepts the signal.
    pub fn request_rotation(&self) {
        let _ = self.rot_sender.send(());
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl LogSink for RotateFileSink {
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

/// Day of month in the local offset, for daily rotation.
fn day_of(created: SystemTime) -> u8 {
    DateTime::from_system_time(created, fastdate::offset_sec()).day() as u8
}

fn open_append(path: &str) -> std::io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o660);
    }
    opts.open(path)
}

fn report(filename: &str, e: &LogError) {
    eprintln!("RotateFileSink({:?}): {}", filename, e);
}

/// Everything the worker owns: the handle plus the counters rotation
/// decisions are made from. Lives by value on the worker thread.
struct SinkState {
    config: RotateConfig,
    file: Option<File>,
    cur_lines: usize,
    cur_bytes: usize,
    open_day: u8,
}

impl SinkState {
    fn new(config: RotateConfig) -> SinkState {
        Self {
            config,
            file: None,
            cur_lines: 0,
            cur_bytes: 0,
            open_day: 0,
        }
    }

    /// Whether writing `record` must be preceded by a rotation.
    fn threshold_tripped(&self, record: &LogRecord) -> bool {
        let c = &self.config;
        if c.max_lines > 0 && self.cur_lines >= c.max_lines {
            return true;
        }
        if c.max_size > 0 && self.cur_bytes >= c.max_size {
            return true;
        }
        c.daily && day_of(record.created) != self.open_day
    }

    /// Close-old / shift / open-new as one synchronous sequence.
    ///
    /// Without `force`, thresholds are measured against the file already on
    /// disk (stat size plus a line count), so a restarted sink resumes its
    /// counters instead of rotating a half-filled file. The trailer written
    /// on the way out is best-effort; every other step aborts the rotation
    /// on failure.
    fn rotate(&mut self, force: bool) -> Result<(), LogError> {
        if let Some(mut file) = self.file.take() {
            let _ = file.write_all(
                formats::format_banner(&self.config.trailer, SystemTime::now()).as_bytes(),
            );
        }

        let mut resume_lines = 0;
        let mut resume_bytes = 0;
        if self.config.rotate {
            match std::fs::metadata(&self.config.filename) {
                Ok(meta) => {
                    let mut need = force;
                    if !need {
                        resume_bytes = meta.len() as usize;
                        resume_lines = count_lines(&self.config.filename).map_err(|e| {
                            LogError::Stat(format!("{:?}: {}", self.config.filename, e))
                        })?;
                        if self.config.max_size > 0 {
                            need = resume_bytes >= self.config.max_size;
                        }
                        if self.config.max_lines > 0 && !need {
                            need = resume_lines >= self.config.max_lines;
                        }
                    }
                    if need {
                        resume_bytes = 0;
                        resume_lines = 0;
                        shift_rotated_files(&self.config.filename, self.config.max_files)?;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(LogError::Stat(format!("{:?}: {}", self.config.filename, e)))
                }
            }
        }

        let file = open_append(&self.config.filename)
            .map_err(|e| LogError::Open(format!("{:?}: {}", self.config.filename, e)))?;
        self.file = Some(file);

        let now = SystemTime::now();
        let header = self.config.header.clone();
        self.write_banner(&header, now)?;
        self.open_day = day_of(now);
        self.cur_lines = resume_lines;
        self.cur_bytes = resume_bytes;
        Ok(())
    }

    fn write_banner(&mut self, template: &str, created: SystemTime) -> Result<(), LogError> {
        if template.is_empty() {
            return Ok(());
        }
        let data = formats::format_banner(template, created);
        if let Some(file) = self.file.as_mut() {
            file.write_all(data.as_bytes())
                .map_err(|e| LogError::Write(format!("{:?}: {}", self.config.filename, e)))?;
        }
        Ok(())
    }

    fn write_record(&mut self, record: &LogRecord) -> Result<(), LogError> {
        let mut data = self.config.format.do_format(record);
        if !data.ends_with('\n') {
            data.push('\n');
        }
        let file = match self.file.as_mut() {
            Some(v) => v,
            None => {
                return Err(LogError::Write(format!(
                    "{:?}: file is not open",
                    self.config.filename
                )))
            }
        };
        file.write_all(data.as_bytes())
            .map_err(|e| LogError::Write(format!("{:?}: {}", self.config.filename, e)))?;
        self.cur_lines += 1;
        self.cur_bytes += data.len();
        Ok(())
    }

    fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            let _ = file.flush();
        }
    }

    /// Trailer plus close, best-effort: the shutdown path never fails.
    fn finish(&mut self) {
        if let Some(mut file) = self.file.take() {
            let _ = file.write_all(
                formats::format_banner(&self.config.trailer, SystemTime::now()).as_bytes(),
            );
            let _ = file.flush();
        }
    }
}

fn worker_loop(config: RotateConfig, receiver: Receiver<Command>, rot_receiver: Receiver<()>) {
    let filename = config.filename.clone();
    let mut state = SinkState::new(config);
    let mut rot_receiver = rot_receiver;

    if let Err(e) = state.rotate(false) {
        report(&filename, &e);
        state.finish();
        return;
    }

    loop {
        select! {
            recv(rot_receiver) -> signal => match signal {
                Ok(()) => {
                    if let Err(e) = state.rotate(true) {
                        report(&filename, &e);
                        state.finish();
                        return;
                    }
                }
                Err(_) => {
                    // handle dropped without close(); drain remaining records
                    rot_receiver = crossbeam::channel::never();
                }
            },
            recv(receiver) -> msg => match msg {
                Ok(Command::CommandRecord(record)) => {
                    if state.threshold_tripped(&record) {
                        if let Err(e) = state.rotate(true) {
                            report(&filename, &e);
                            state.finish();
                            return;
                        }
                    }
                    if let Err(e) = state.write_record(&record) {
                        report(&filename, &e);
                        state.finish();
                        return;
                    }
                }
                Ok(Command::CommandFlush(wg)) => {
                    state.flush();
                    drop(wg);
                }
                Ok(Command::CommandExit) | Err(_) => break,
            },
        }
    }
    state.finish();
}
