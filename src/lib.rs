#![forbid(unsafe_code)]

pub mod appender;
pub mod config;
pub mod consts;
pub mod error;
pub mod filter;
pub mod formats;
pub mod plugin;
pub mod roto_log;
pub mod runtime;
pub mod wait;

pub use config::Config;
pub use formats::TemplateFormat;
pub use roto_log::*;
pub use runtime::*;
pub use wait::LogWaitGroup;
