//! `lopdf`-backed document parser.

use std::sync::Arc;

use lopdf::Document;
use tracing::debug;

use super::{DocumentParser, ExtractError, PageSource};

/// Parses PDF bytes with `lopdf` and serves text one page at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfParser;

impl DocumentParser for LopdfParser {
    fn open(&self, bytes: &[u8]) -> Result<Arc<dyn PageSource>, ExtractError> {
        let document = Document::load_mem(bytes).map_err(|e| {
            if declares_encryption(bytes) {
                ExtractError::PasswordProtected
            } else {
                ExtractError::CorruptDocument(e.to_string())
            }
        })?;

        if document.is_encrypted() {
            return Err(ExtractError::PasswordProtected);
        }

        // get_pages is keyed by 1-based page number, already sorted.
        let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
        debug!("PDF loaded with {} pages", page_numbers.len());

        Ok(Arc::new(LopdfPages {
            document,
            page_numbers,
        }))
    }
}

struct LopdfPages {
    document: Document,
    page_numbers: Vec<u32>,
}

impl PageSource for LopdfPages {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> anyhow::Result<String> {
        let page_number = *self
            .page_numbers
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("page index {index} out of range"))?;
        Ok(self.document.extract_text(&[page_number])?)
    }
}

/// True when the raw bytes carry an `/Encrypt` entry.
fn declares_encryption(bytes: &[u8]) -> bool {
    const MARKER: &[u8] = b"/Encrypt";
    bytes.windows(MARKER.len()).any(|w| w == MARKER)
}
