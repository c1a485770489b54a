use std::fs;

use roto_log::appender::LogSink;
use roto_log::plugin::file_rotate::{RotateConfig, RotateFileSink};
use roto_log::plugin::rotation::numbered_name;

#[test]
fn test_forced_rotation_respects_retention_cap() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.log");
    let file = file.to_str().unwrap();
    fs::write(file, "active\n").unwrap();
    fs::write(numbered_name(file, 1), "one\n").unwrap();
    fs::write(numbered_name(file, 2), "two\n").unwrap();
    fs::write(numbered_name(file, 3), "three\n").unwrap();

    let sink = RotateFileSink::new(RotateConfig::new(file).max_files(3).format("%M"), 16);
    sink.request_rotation();
    sink.close();
    sink.wait();

    // the previous active file took slot 1, slot 1 shifted up, and the
    // oldest retained slot was evicted to stay within the cap
    assert_eq!(fs::read_to_string(numbered_name(file, 1)).unwrap(), "active\n");
    assert_eq!(fs::read_to_string(numbered_name(file, 2)).unwrap(), "one\n");
    assert!(!fs::metadata(numbered_name(file, 4)).is_ok());

    // the slot sitting at the cap is outside the index: orphaned, untouched
    assert_eq!(fs::read_to_string(numbered_name(file, 3)).unwrap(), "three\n");

    // a fresh active file was opened
    assert!(fs::metadata(file).is_ok());
}

#[test]
fn test_size_threshold_rotation() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("app.log");
    let file = file.to_str().unwrap();

    let sink = RotateFileSink::new(
        RotateConfig::new(file)
            .max_size(roto_log::consts::LogSize::B(64))
            .format("%M"),
        16,
    );
    // 19 bytes per line with the newline
    for n in 0..6 {
        sink.enqueue(roto_log::appender::LogRecord {
            level: log::Level::Info,
            created: std::time::SystemTime::now(),
            source: String::new(),
            message: format!("padded message {:03}", n),
        });
    }
    sink.close();
    sink.wait();

    // the counter passes 64 bytes after the 4th line (76), so records 0..=3
    // rotate away and 4..=5 stay active
    let rotated = fs::read_to_string(numbered_name(file, 1)).unwrap();
    let active = fs::read_to_string(file).unwrap();
    assert_eq!(rotated.lines().count(), 4);
    assert_eq!(active.lines().count(), 2);
    assert!(rotated.starts_with("padded message 000"));
    assert!(active.starts_with("padded message 004"));
}
