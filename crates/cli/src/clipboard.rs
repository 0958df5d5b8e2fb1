//! Terminal clipboard via the OSC 52 escape sequence

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::IsTerminal;
use tokio::io::AsyncWriteExt;
use tryon_core::present::Clipboard;
use tryon_core::{TryOnError, TryOnResult};

/// Asks the terminal emulator to place text on the system clipboard
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    /// Only offered when stdout is an interactive terminal
    pub fn detect() -> Option<Self> {
        std::io::stdout().is_terminal().then_some(Self)
    }
}

#[async_trait]
impl Clipboard for Osc52Clipboard {
    async fn write_text(&self, text: &str) -> TryOnResult<()> {
        let sequence = format!("\x1b]52;c;{}\x07", STANDARD.encode(text));
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(sequence.as_bytes())
            .await
            .map_err(|e| TryOnError::Export(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| TryOnError::Export(e.to_string()))
    }
}
