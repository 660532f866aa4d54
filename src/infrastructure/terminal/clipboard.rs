use crate::domain::ports::clipboard::Clipboard;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io::Write;
use std::sync::Mutex;

/// Clipboard backed by the OSC 52 terminal escape sequence.
///
/// The terminal emulator, not this process, owns the clipboard; emulators
/// that ignore OSC 52 silently drop the write.
pub struct Osc52Clipboard<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text))
}

#[async_trait]
impl<W: Write + Send + 'static> Clipboard for Osc52Clipboard<W> {
    async fn write_text(&self, text: &str) -> Result<(), String> {
        let mut out = self.out.lock().map_err(|_| "clipboard writer poisoned".to_string())?;
        out.write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| e.to_string())
    }
}
