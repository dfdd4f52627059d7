// Copy-to-clipboard with a system clipboard first and a terminal escape fallback

use std::io::Write;
use thiserror::Error;

/// Guidance shown when no mechanism could copy the text
pub const MANUAL_COPY_MESSAGE: &str =
    "Could not copy to clipboard. Please select the document text and copy it manually.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CopyError {
    #[error("There is no document to copy")]
    NothingToCopy,

    #[error("{backend} clipboard unavailable: {reason}")]
    Unavailable {
        backend: &'static str,
        reason: String,
    },
}

/// A mechanism that can place text on a clipboard
pub trait ClipboardBackend {
    fn name(&self) -> &'static str;

    fn copy(&mut self, text: &str) -> Result<(), CopyError>;
}

/// The desktop clipboard through `arboard`
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn name(&self) -> &'static str {
        "system"
    }

    fn copy(&mut self, text: &str) -> Result<(), CopyError> {
        let unavailable = |e: arboard::Error| CopyError::Unavailable {
            backend: "system",
            reason: e.to_string(),
        };

        let mut clipboard = arboard::Clipboard::new().map_err(unavailable)?;
        clipboard.set_text(text.to_owned()).map_err(unavailable)
    }
}

/// Writes an OSC 52 escape so the terminal emulator sets its clipboard
#[derive(Debug)]
pub struct Osc52Clipboard<W: Write> {
    out: W,
}

impl Osc52Clipboard<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Osc52Clipboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ClipboardBackend for Osc52Clipboard<W> {
    fn name(&self) -> &'static str {
        "osc52"
    }

    fn copy(&mut self, text: &str) -> Result<(), CopyError> {
        let unavailable = |e: std::io::Error| CopyError::Unavailable {
            backend: "osc52",
            reason: e.to_string(),
        };

        self.out
            .write_all(osc52_sequence(text).as_bytes())
            .map_err(unavailable)?;
        self.out.flush().map_err(unavailable)
    }
}

pub fn osc52_sequence(text: &str) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    let encoded = STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x1b\\")
}

/// Try `primary`, then `fallback`. Returns the name of the backend that succeeded,
/// or the last failure.
pub fn copy_with_fallback(
    text: &str,
    primary: &mut dyn ClipboardBackend,
    fallback: Option<&mut dyn ClipboardBackend>,
) -> Result<&'static str, CopyError> {
    if text.is_empty() {
        return Err(CopyError::NothingToCopy);
    }

    let primary_err = match primary.copy(text) {
        Ok(()) => return Ok(primary.name()),
        Err(e) => e,
    };
    log::debug!("Primary clipboard failed: {}", primary_err);

    match fallback {
        Some(backend) => {
            backend.copy(text)?;
            Ok(backend.name())
        }
        None => Err(primary_err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl ClipboardBackend for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn copy(&mut self, _text: &str) -> Result<(), CopyError> {
            Err(CopyError::Unavailable {
                backend: "failing",
                reason: "no display".to_string(),
            })
        }
    }

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x1b\\");
    }

    #[test]
    fn test_fallback_used_when_primary_fails() {
        let mut osc = Osc52Clipboard::new(Vec::new());
        let used = copy_with_fallback("hi", &mut Failing, Some(&mut osc)).unwrap();
        assert_eq!(used, "osc52");
        assert_eq!(osc.into_inner(), b"\x1b]52;c;aGk=\x1b\\".to_vec());
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let mut primary = Osc52Clipboard::new(Vec::new());
        let mut fallback = Osc52Clipboard::new(Vec::new());
        let used = copy_with_fallback("hi", &mut primary, Some(&mut fallback)).unwrap();
        assert_eq!(used, "osc52");
        assert!(fallback.into_inner().is_empty());
    }

    #[test]
    fn test_no_fallback_reports_primary_error() {
        let err = copy_with_fallback("hi", &mut Failing, None).unwrap_err();
        assert!(matches!(err, CopyError::Unavailable { backend: "failing", .. }));
    }

    #[test]
    fn test_empty_text() {
        let err = copy_with_fallback("", &mut Failing, None).unwrap_err();
        assert_eq!(err, CopyError::NothingToCopy);
    }
}
