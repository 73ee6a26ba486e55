//! Resume text extraction. Reads an uploaded PDF page by page.
//!
//! Pages are visited in document order and their text is concatenated with no
//! separator. A page that yields no text contributes the empty string rather
//! than aborting the extraction; its number is recorded in
//! [`Document::blank_pages`] so callers can surface it if they want to.
//!
//! A document whose every page is blank is still a valid result (empty text).
//! Only an unparseable file or a document with zero pages is an error.

use lopdf::Document as PdfDocument;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Document could not be read as a PDF: {reason}")]
    Unreadable { reason: String },

    #[error("Document contains no pages")]
    Empty,
}

/// Plain text derived from an uploaded document. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub text: String,
    pub page_count: usize,
    /// 1-based numbers of the pages that produced no text.
    pub blank_pages: Vec<usize>,
}

impl Document {
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Converts raw uploaded bytes into a [`Document`].
///
/// Held in `AppState` as `Arc<dyn DocumentExtractor>`.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<Document, ExtractionError>;
}

/// Anything that can hand out text one page at a time.
pub trait PagedText {
    fn page_count(&self) -> usize;

    /// Text of the page at `index` (0-based), or `None` if none could be extracted.
    fn page_text(&self, index: usize) -> Option<String>;
}

/// Concatenates every page of `source` in order.
pub fn assemble<P: PagedText + ?Sized>(source: &P) -> Result<Document, ExtractionError> {
    let page_count = source.page_count();
    if page_count == 0 {
        return Err(ExtractionError::Empty);
    }

    let mut text = String::new();
    let mut blank_pages = Vec::new();

    for index in 0..page_count {
        let page = source.page_text(index).unwrap_or_default();
        if page.trim().is_empty() {
            blank_pages.push(index + 1);
        }
        text.push_str(&page);
    }

    Ok(Document {
        text,
        page_count,
        blank_pages,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// lopdf-backed extractor
// ────────────────────────────────────────────────────────────────────────────

/// PDF extractor backed by lopdf's per-page text extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl DocumentExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<Document, ExtractionError> {
        if !bytes.starts_with(PDF_MAGIC) {
            let head = &bytes[..bytes.len().min(PDF_MAGIC.len())];
            return Err(ExtractionError::Unreadable {
                reason: format!("missing %PDF- header (first bytes: {head:?})"),
            });
        }

        let pdf = PdfDocument::load_mem(bytes).map_err(|e| ExtractionError::Unreadable {
            reason: e.to_string(),
        })?;

        if pdf.is_encrypted() {
            return Err(ExtractionError::Unreadable {
                reason: "document is encrypted".to_string(),
            });
        }

        let document = assemble(&LopdfPages::new(&pdf))?;

        debug!(
            "Extracted {} chars from {} pages ({} blank)",
            document.text.len(),
            document.page_count,
            document.blank_pages.len()
        );

        Ok(document)
    }
}

struct LopdfPages<'a> {
    pdf: &'a PdfDocument,
    numbers: Vec<u32>,
}

impl<'a> LopdfPages<'a> {
    fn new(pdf: &'a PdfDocument) -> Self {
        // get_pages() is a BTreeMap keyed by page number, so keys are already in order.
        let numbers = pdf.get_pages().into_keys().collect();
        Self { pdf, numbers }
    }
}

impl PagedText for LopdfPages<'_> {
    fn page_count(&self) -> usize {
        self.numbers.len()
    }

    fn page_text(&self, index: usize) -> Option<String> {
        let number = *self.numbers.get(index)?;
        match self.pdf.extract_text(&[number]) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("No text extracted from page {number}: {e}");
                None
            }
        }
    }
}
