//! Code scanner abstraction.
//!
//! The kiosk never talks to a camera directly. Whatever reads codes (a
//! camera library, a USB wedge reader, a terminal prompt) implements
//! [`Scanner`] and hands back the decoded text.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Barcode symbologies the scanner should accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeFormat {
    /// QR codes only; bibs and bloc tags are printed as QR.
    #[default]
    QrCode,
    /// Anything the device can decode.
    Any,
}

/// Result of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Decoded text.
    Scanned(String),
    /// Operator backed out.
    Cancelled,
    /// Device error.
    Failed(String),
}

/// Something that can read a code.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Scan a single code in the given format.
    async fn scan(&self, format: CodeFormat) -> ScanOutcome;
}

/// Scanner that replays a fixed script, for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct ScriptedScanner {
    inner: Arc<Mutex<ScriptedInner>>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    script: VecDeque<ScanOutcome>,
    formats: Vec<CodeFormat>,
}

impl ScriptedScanner {
    /// Create a scanner that replays `script` in order.
    pub fn new(script: impl IntoIterator<Item = ScanOutcome>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptedInner {
                script: script.into_iter().collect(),
                formats: Vec::new(),
            })),
        }
    }

    /// Append a successful scan.
    pub fn push_code(&self, code: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.script.push_back(ScanOutcome::Scanned(code.into()));
    }

    /// Formats requested so far, oldest first.
    pub fn requested_formats(&self) -> Vec<CodeFormat> {
        let inner = self.inner.lock().unwrap();
        inner.formats.clone()
    }
}

#[async_trait]
impl Scanner for ScriptedScanner {
    async fn scan(&self, format: CodeFormat) -> ScanOutcome {
        let mut inner = self.inner.lock().unwrap();
        inner.formats.push(format);
        inner
            .script
            .pop_front()
            .unwrap_or_else(|| ScanOutcome::Failed("script exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script() {
        let scanner = ScriptedScanner::new([
            ScanOutcome::Scanned("12".into()),
            ScanOutcome::Cancelled,
        ]);

        assert_eq!(
            scanner.scan(CodeFormat::QrCode).await,
            ScanOutcome::Scanned("12".into())
        );
        assert_eq!(scanner.scan(CodeFormat::Any).await, ScanOutcome::Cancelled);
        assert!(matches!(
            scanner.scan(CodeFormat::QrCode).await,
            ScanOutcome::Failed(_)
        ));
        assert_eq!(
            scanner.requested_formats(),
            vec![CodeFormat::QrCode, CodeFormat::Any, CodeFormat::QrCode]
        );
    }

    #[tokio::test]
    async fn push_code_appends() {
        let scanner = ScriptedScanner::default();
        scanner.push_code("F3");
        assert_eq!(
            scanner.scan(CodeFormat::default()).await,
            ScanOutcome::Scanned("F3".into())
        );
    }
}
