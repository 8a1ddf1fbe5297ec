//! Document loading and inspection

use lopdf::Document;

use crate::PdfError;

/// Page dimensions in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// US Letter, the fallback when a page carries no MediaBox.
    pub const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };
}

/// Load a document from bytes, rejecting encrypted files up front.
///
/// The encryption check is a byte scan rather than a parse: lopdf can
/// load some encrypted files without error and then return garbage
/// content streams, so we refuse before parsing.
pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfError> {
    if bytes.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt") {
        return Err(PdfError::EncryptedUnsupported);
    }
    Ok(Document::load_mem(bytes)?)
}

/// Media box sizes for every page, in document page order.
pub fn page_sizes(bytes: &[u8]) -> Result<Vec<PageSize>, PdfError> {
    let doc = load(bytes)?;
    let pages = doc.get_pages();
    let mut sizes = Vec::with_capacity(pages.len());

    for (_, object_id) in pages {
        let dict = doc.get_dictionary(object_id)?;
        let size = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| {
                if array.len() != 4 {
                    return None;
                }
                let x0 = array[0].as_float().ok()?;
                let y0 = array[1].as_float().ok()?;
                let x1 = array[2].as_float().ok()?;
                let y1 = array[3].as_float().ok()?;
                Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
            })
            .unwrap_or(PageSize::LETTER);
        sizes.push(size);
    }

    if sizes.is_empty() {
        return Err(PdfError::EmptyDocument);
    }

    Ok(sizes)
}

/// Number of pages in the document.
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfError> {
    Ok(page_sizes(bytes)?.len() as u32)
}
