use std::time::SystemTime;

use fastdate::DateTime;

use crate::appender::{LogRecord, RecordFormat};

/// Default record template: `[2009/01/23 01:23:23] [INFO] (src/main.rs:7) hi`.
pub const DEFAULT_RECORD_TEMPLATE: &str = "[%D %T] [%L] (%S) %M";

/// Expand a record template.
///
/// Placeholders: `%D` date (`YYYY/MM/DD`), `%T` time (`hh:mm:ss`), `%L`
/// level, `%S` source location, `%M` message, `%%` a literal percent.
/// Unknown sequences pass through unchanged.
pub fn format_record(template: &str, record: &LogRecord) -> String {
    expand(template, record.created, Some(record))
}

/// Expand a header/trailer template. Only the timestamp placeholders carry
/// a value; `%L`/`%S`/`%M` expand to nothing.
pub fn format_banner(template: &str, created: SystemTime) -> String {
    expand(template, created, None)
}

fn expand(template: &str, created: SystemTime, record: Option<&LogRecord>) -> String {
    if template.is_empty() {
        return String::new();
    }
    let dt = DateTime::from_system_time(created, fastdate::offset_sec());
    let mut out = String::with_capacity(template.len() + 32);
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('D') => out.push_str(&dt.format("YYYY/MM/DD")),
            Some('T') => out.push_str(&dt.format("hh:mm:ss")),
            Some('L') => {
                if let Some(r) = record {
                    out.push_str(r.level.as_str());
                }
            }
            Some('S') => {
                if let Some(r) = record {
                    out.push_str(&r.source);
                }
            }
            Some('M') => {
                if let Some(r) = record {
                    out.push_str(&r.message);
                }
            }
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

/// A [`RecordFormat`] driven by a template string.
pub struct TemplateFormat {
    template: String,
}

impl TemplateFormat {
    pub fn new(template: &str) -> TemplateFormat {
        Self {
            template: template.to_string(),
        }
    }
}

impl Default for TemplateFormat {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_TEMPLATE)
    }
}

impl RecordFormat for TemplateFormat {
    fn do_format(&self, record: &LogRecord) -> String {
        format_record(&self.template, record)
    }
}

#[cfg(test)]
mod test {
    use std::time::SystemTime;

    use log::Level;

    use super::{format_banner, format_record};
    use crate::appender::LogRecord;

    fn record() -> LogRecord {
        LogRecord {
            level: Level::Warn,
            created: SystemTime::now(),
            source: "src/lib.rs:42".to_string(),
            message: "disk is 90% full".to_string(),
        }
    }

    #[test]
    fn test_placeholders() {
        let out = format_record("[%L] (%S) %M", &record());
        assert_eq!(out, "[WARN] (src/lib.rs:42) disk is 90% full");
    }

    #[test]
    fn test_date_and_time_shapes() {
        let out = format_record("%D|%T", &record());
        let (date, time) = out.split_once('|').unwrap();
        assert_eq!(date.len(), 10);
        assert_eq!(&date[4..5], "/");
        assert_eq!(&date[7..8], "/");
        assert_eq!(time.len(), 8);
        assert_eq!(&time[2..3], ":");
    }

    #[test]
    fn test_escapes_and_unknown() {
        let out = format_record("100%% %X %M", &record());
        assert_eq!(out, "100% %X disk is 90% full");
        assert_eq!(format_record("trailing %", &record()), "trailing %");
    }

    #[test]
    fn test_banner_has_no_record_fields() {
        let out = format_banner("<log at %D %T>%L%S%M</log>", SystemTime::now());
        assert!(out.starts_with("<log at "));
        // %L/%S/%M contribute nothing, so the tag closes right away
        assert!(out.ends_with("></log>"));
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(format_banner("", SystemTime::now()), "");
    }
}
