//! Ambient infrastructure: logging setup and the diagnostic channel

pub mod diagnostics;
pub mod logging;

pub use logging::{
    init_dev_logging, init_file_logging, init_logging, LogConfig, LogFormat, LogOutput,
};
