//! PDF serialization for Marginalia
//!
//! Flattens in-memory annotations into PDF content streams (the output
//! is an ordinary PDF with the marks baked into each page) and provides
//! whole-document page operations: rotate, reorder, extract, split and
//! merge. All operations take the source document as bytes and return
//! new bytes; the input is never modified in place.

pub mod document;
pub mod export;
pub mod pages;

pub use document::{page_count, page_sizes, PageSize};
pub use export::export_with_annotations;
pub use pages::{collate_pages, merge_documents, move_page, rotate_page, split_pages};

/// Errors for PDF loading, export and page operations
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,

    #[error("document has no pages")]
    EmptyDocument,

    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("invalid page range {from}..={to}")]
    InvalidPageRange { from: u32, to: u32 },

    #[error("rotation {0} is not a multiple of 90 degrees")]
    InvalidRotation(i64),
}
