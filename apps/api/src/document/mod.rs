// Document ingestion: turns an uploaded resume into grounding text.
// Extraction is CPU-bound; async callers run it under spawn_blocking.

pub mod extractor;

pub use extractor::{Document, DocumentExtractor, ExtractionError, PdfExtractor};
