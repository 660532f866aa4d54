use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Destination of the "copy key" action
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), String>;
}

/// Clipboard that keeps every copied value, for testing
#[derive(Clone, Default)]
pub struct RecordingClipboard {
    copied: Arc<Mutex<Vec<String>>>,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn copied(&self) -> Vec<String> {
        self.copied.lock().await.clone()
    }
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), String> {
        self.copied.lock().await.push(text.to_string());
        Ok(())
    }
}
