//! Serialization bridge - JSON through the runtime's encoder and decoder
//!
//! File variants open a runtime file object in text mode and close it on
//! every exit path through [`FileGuard`].

use std::path::Path;

use pyobj_runtime::{api, ObjRef, RtResult};

use crate::config;
use crate::core::Handle;
use crate::infrastructure::diagnostics;
use crate::views::Text;

/// Compact JSON text (`", "` and `": "` separators); empty text on failure
pub fn encode(value: &Handle) -> Text {
    encode_indent(value, None)
}

/// JSON text, pretty-printed when `indent` is given
pub fn encode_indent(value: &Handle, indent: Option<usize>) -> Text {
    match dumps(value, indent) {
        Some(text) => Text::from(text),
        None => Text::new(),
    }
}

/// JSON text using the configured `[json] indent`
pub fn encode_default(value: &Handle) -> Text {
    encode_indent(value, config::current().json.indent)
}

fn dumps(value: &Handle, indent: Option<usize>) -> Option<String> {
    value.query("json.encode", None, |raw| api::json_dumps(raw, indent).map(Some))
}

/// Parse JSON text; empty handle when `text` is not JSON
pub fn decode(text: &str) -> Handle {
    Handle::from_result("json.decode", api::json_loads(text))
}

/// Open runtime file object, closed when the guard drops
pub struct FileGuard {
    file: Handle,
}

impl FileGuard {
    pub fn open(path: &Path, mode: &str) -> RtResult<Self> {
        let raw = api::open(&path.to_string_lossy(), mode)?;
        Ok(Self {
            file: Handle::from_owned(raw),
        })
    }

    fn raw(&self) -> RtResult<ObjRef> {
        self.file.require()
    }

    pub fn read(&self) -> RtResult<String> {
        api::file_read(self.raw()?)
    }

    pub fn write(&self, text: &str) -> RtResult<usize> {
        api::file_write(self.raw()?, text)
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if let Some(raw) = self.file.raw() {
            if let Err(err) = api::file_close(raw) {
                diagnostics::report("json.file", err);
            }
        }
    }
}

/// Write `value` as JSON to `path`; returns whether the whole write succeeded
pub fn dump_file(value: &Handle, path: impl AsRef<Path>, indent: Option<usize>) -> bool {
    let path = path.as_ref();
    let Some(text) = dumps(value, indent) else {
        return false;
    };
    let written = FileGuard::open(path, "w").and_then(|file| file.write(&text));
    match written {
        Ok(_) => true,
        Err(err) => {
            diagnostics::report("json.dump_file", format!("{}: {}", path.display(), err));
            false
        }
    }
}

/// Read and parse the JSON file at `path`; empty handle on failure
pub fn load_file(path: impl AsRef<Path>) -> Handle {
    let path = path.as_ref();
    let text = FileGuard::open(path, "r").and_then(|file| file.read());
    match text {
        Ok(text) => decode(&text),
        Err(err) => {
            diagnostics::report("json.load_file", format!("{}: {}", path.display(), err));
            Handle::empty()
        }
    }
}
