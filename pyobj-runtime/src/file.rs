//! Text-mode file objects
//!
//! The runtime keeps a process-wide count of open files so callers can
//! verify that every file they opened was closed again.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ExcKind, RtResult, RuntimeError};
use crate::logging::trace;

static OPEN_FILES: AtomicUsize = AtomicUsize::new(0);

/// Number of file objects currently open
pub(crate) fn open_files() -> usize {
    OPEN_FILES.load(Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileMode {
    Read,
    Write,
    Append,
}

impl FileMode {
    pub fn parse(mode: &str) -> RtResult<Self> {
        // Text mode only; "t" is accepted and ignored
        let bare: String = mode.chars().filter(|c| *c != 't').collect();
        match bare.as_str() {
            "r" | "" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "a" => Ok(Self::Append),
            _ => Err(RuntimeError::value_error(format!(
                "invalid mode: '{}'",
                mode
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::Append => "a",
        }
    }
}

pub(crate) struct FileObject {
    path: String,
    mode: FileMode,
    file: Option<File>,
}

fn os_error(path: &str, err: std::io::Error) -> RuntimeError {
    RuntimeError::new(ExcKind::OSError, format!("{}: '{}'", err, path))
}

impl FileObject {
    pub fn open(path: &str, mode: FileMode) -> RtResult<Self> {
        let result = match mode {
            FileMode::Read => File::open(path),
            FileMode::Write => File::create(path),
            FileMode::Append => OpenOptions::new().append(true).create(true).open(path),
        };
        let file = result.map_err(|err| os_error(path, err))?;
        let open = OPEN_FILES.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(event = "file_open", path, mode = mode.as_str(), open);
        Ok(Self {
            path: path.to_string(),
            mode,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn handle(&mut self) -> RtResult<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            RuntimeError::value_error("I/O operation on closed file.")
        })
    }

    pub fn read(&mut self) -> RtResult<String> {
        if self.mode != FileMode::Read {
            return Err(RuntimeError::new(ExcKind::OSError, "not readable"));
        }
        let mut text = String::new();
        let path = self.path.clone();
        self.handle()?
            .read_to_string(&mut text)
            .map_err(|err| os_error(&path, err))?;
        Ok(text)
    }

    /// Write text, returning the number of characters written
    pub fn write(&mut self, text: &str) -> RtResult<usize> {
        if self.mode == FileMode::Read {
            return Err(RuntimeError::new(ExcKind::OSError, "not writable"));
        }
        let path = self.path.clone();
        self.handle()?
            .write_all(text.as_bytes())
            .map_err(|err| os_error(&path, err))?;
        Ok(text.chars().count())
    }

    /// Close the file; closing twice is allowed
    pub fn close(&mut self) -> RtResult<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        let open = OPEN_FILES.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(event = "file_close", path = %self.path, open);
        file.flush().map_err(|err| os_error(&self.path, err))
    }
}

impl Drop for FileObject {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
