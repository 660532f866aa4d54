use std::sync::{Arc, Mutex};

/// Destinations outside the dashboard state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Config,
    Logs,
}

impl NavTarget {
    pub fn path(&self) -> &'static str {
        match self {
            NavTarget::Config => "/config",
            NavTarget::Logs => "/logs",
        }
    }
}

/// External router. The dashboard only emits the intent; it never renders
/// these destinations itself.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavTarget);
}

/// Navigator that records requested targets, for testing
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    targets: Arc<Mutex<Vec<NavTarget>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(&self) -> Vec<NavTarget> {
        match self.targets.lock() {
            Ok(targets) => targets.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: NavTarget) {
        match self.targets.lock() {
            Ok(mut targets) => targets.push(target),
            Err(poisoned) => poisoned.into_inner().push(target),
        }
    }
}
