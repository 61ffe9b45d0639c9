//! Document Text Extractor: turns an uploaded PDF into plain text.
//!
//! Flow: validate (empty → type → size) → parse → extract first 30 pages
//! concurrently → join with blank lines → reject if too little text.
//! Parse and page extraction together race a hard deadline.

pub mod pdf;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use pdf::LopdfParser;

pub const ACCEPTED_MEDIA_TYPE: &str = "application/pdf";
pub const MAX_DOCUMENT_BYTES: usize = 15 * 1024 * 1024;
pub const MAX_PAGES: usize = 30;
pub const MIN_TEXT_CHARS: usize = 200;
pub const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No file provided")]
    EmptyInput,

    #[error("Unsupported media type '{media_type}', expected application/pdf")]
    UnsupportedType { media_type: String },

    #[error("Document is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Document parsing exceeded {0:?}")]
    Timeout(Duration),

    #[error("Document is password-protected")]
    PasswordProtected,

    #[error("Document could not be parsed: {0}")]
    CorruptDocument(String),

    #[error("Only {chars} characters of text could be extracted")]
    LikelyScannedDocument { chars: usize },
}

impl ExtractError {
    /// True for rejections made before the document is parsed.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ExtractError::EmptyInput
                | ExtractError::UnsupportedType { .. }
                | ExtractError::TooLarge { .. }
        )
    }
}

/// Raw upload as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub content: Bytes,
    pub media_type: String,
    pub file_name: Option<String>,
}

impl UploadedDocument {
    pub fn new(content: impl Into<Bytes>, media_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            media_type: media_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Joined page text plus how much of the document it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub pages_processed: usize,
    pub total_pages: usize,
}

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.trim().chars().count()
    }

    pub fn is_truncated(&self) -> bool {
        self.total_pages > self.pages_processed
    }
}

/// Opens document bytes into something that can be read page by page.
pub trait DocumentParser: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Arc<dyn PageSource>, ExtractError>;
}

/// A parsed document. Page indices are zero-based.
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> usize;
    fn page_text(&self, index: usize) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    pub max_bytes: usize,
    pub max_pages: usize,
    pub min_chars: usize,
    pub timeout: Duration,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_bytes: MAX_DOCUMENT_BYTES,
            max_pages: MAX_PAGES,
            min_chars: MIN_TEXT_CHARS,
            timeout: EXTRACTION_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct TextExtractor {
    parser: Arc<dyn DocumentParser>,
    limits: ExtractionLimits,
}

impl TextExtractor {
    pub fn new(parser: Arc<dyn DocumentParser>) -> Self {
        Self::with_limits(parser, ExtractionLimits::default())
    }

    pub fn with_limits(parser: Arc<dyn DocumentParser>, limits: ExtractionLimits) -> Self {
        Self { parser, limits }
    }

    pub async fn extract_text(
        &self,
        doc: &UploadedDocument,
    ) -> Result<ExtractedText, ExtractError> {
        self.validate(doc)?;

        info!(
            "Extracting text from {} ({} bytes)",
            doc.file_name.as_deref().unwrap_or("upload"),
            doc.size()
        );

        let extracted = tokio::time::timeout(
            self.limits.timeout,
            self.extract_pages(doc.content.clone()),
        )
        .await
        .map_err(|_| ExtractError::Timeout(self.limits.timeout))??;

        let chars = extracted.char_count();
        if chars < self.limits.min_chars {
            warn!("Extracted only {chars} characters, treating as scanned document");
            return Err(ExtractError::LikelyScannedDocument { chars });
        }

        info!(
            "Extracted {} characters from {}/{} pages",
            chars, extracted.pages_processed, extracted.total_pages
        );
        Ok(extracted)
    }

    fn validate(&self, doc: &UploadedDocument) -> Result<(), ExtractError> {
        if doc.content.is_empty() {
            return Err(ExtractError::EmptyInput);
        }
        if !is_accepted_media_type(&doc.media_type) {
            return Err(ExtractError::UnsupportedType {
                media_type: doc.media_type.clone(),
            });
        }
        if doc.size() > self.limits.max_bytes {
            return Err(ExtractError::TooLarge {
                size: doc.size(),
                limit: self.limits.max_bytes,
            });
        }
        Ok(())
    }

    async fn extract_pages(&self, content: Bytes) -> Result<ExtractedText, ExtractError> {
        let parser = Arc::clone(&self.parser);
        let source = tokio::task::spawn_blocking(move || parser.open(&content))
            .await
            .map_err(|e| ExtractError::CorruptDocument(format!("parser task failed: {e}")))??;

        let total_pages = source.page_count();
        if total_pages == 0 {
            return Err(ExtractError::CorruptDocument(
                "document contains no pages".to_string(),
            ));
        }

        let pages_processed = total_pages.min(self.limits.max_pages);
        if pages_processed < total_pages {
            info!("Document has {total_pages} pages, processing the first {pages_processed}");
        }

        let tasks = (0..pages_processed).map(|index| {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || source.page_text(index))
        });

        // join_all yields in input order, so page order survives out-of-order completion.
        let page_texts: Vec<String> = join_all(tasks)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| match outcome {
                Ok(Ok(text)) => {
                    if text.trim().is_empty() {
                        debug!("No text content found on page {}", index + 1);
                    }
                    text
                }
                Ok(Err(e)) => {
                    warn!("Error extracting text from page {}: {e}", index + 1);
                    String::new()
                }
                Err(e) => {
                    warn!("Page {} extraction task failed: {e}", index + 1);
                    String::new()
                }
            })
            .collect();

        Ok(ExtractedText {
            text: page_texts.join(PAGE_SEPARATOR),
            pages_processed,
            total_pages,
        })
    }
}

/// Compares the essence of a MIME type, ignoring case and parameters.
fn is_accepted_media_type(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case(ACCEPTED_MEDIA_TYPE))
        .unwrap_or(false)
}
