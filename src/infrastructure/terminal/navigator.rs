use crate::domain::ports::navigator::{NavTarget, Navigator};
use std::io::Write;
use std::sync::Mutex;
use tracing::{info, warn};

/// Points the operator at the page served by the Remote Key Service
pub struct TerminalNavigator<W> {
    base_url: String,
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalNavigator<W> {
    pub fn new(base_url: impl Into<String>, out: W) -> Self {
        Self {
            base_url: base_url.into(),
            out: Mutex::new(out),
        }
    }

    pub fn url_for(&self, target: NavTarget) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), target.path())
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Navigator for TerminalNavigator<W> {
    fn navigate(&self, target: NavTarget) {
        let url = self.url_for(target);
        info!("Leaving dashboard for {}", url);

        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "Open {} to continue", url) {
            warn!("Failed to print navigation target: {}", e);
        }
    }
}
