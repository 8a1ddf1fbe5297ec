//! Whole-document page operations
//!
//! Rotation, reordering, range extraction, per-page splitting and
//! multi-document merging. Page numbers are 1-indexed throughout, and
//! every operation validates its indices before touching the document.

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::document;
use crate::PdfError;

/// Set a page's absolute rotation. `degrees` must be a multiple of 90
/// and is normalized into `[0, 360)`.
pub fn rotate_page(bytes: &[u8], page: u32, degrees: i64) -> Result<Vec<u8>, PdfError> {
    if degrees % 90 != 0 {
        return Err(PdfError::InvalidRotation(degrees));
    }
    let normalized = degrees.rem_euclid(360);

    let mut doc = document::load(bytes)?;
    let pages = doc.get_pages();
    let page_id = *pages
        .get(&page)
        .ok_or(PdfError::PageOutOfRange { page, page_count: pages.len() as u32 })?;

    doc.get_object_mut(page_id)?.as_dict_mut()?.set("Rotate", normalized);
    tracing::debug!(page, degrees = normalized, "set page rotation");

    save(doc)
}

/// Move one page to a new position, shifting the pages in between.
///
/// The page tree is rebuilt as a single flat /Pages node under the
/// existing root, so attributes inherited from intermediate tree nodes
/// do not survive. Moving a page onto itself returns the input
/// unchanged.
pub fn move_page(bytes: &[u8], from: u32, to: u32) -> Result<Vec<u8>, PdfError> {
    let mut doc = document::load(bytes)?;
    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    for page in [from, to] {
        if page == 0 || page > page_count {
            return Err(PdfError::PageOutOfRange { page, page_count });
        }
    }
    if from == to {
        return Ok(bytes.to_vec());
    }

    let mut order: Vec<ObjectId> = pages.values().copied().collect();
    let moved = order.remove(from as usize - 1);
    order.insert(to as usize - 1, moved);

    let root_id = doc.catalog()?.get(b"Pages")?.as_reference()?;
    for page_id in &order {
        doc.get_object_mut(*page_id)?.as_dict_mut()?.set("Parent", root_id);
    }
    let kids: Vec<Object> = order.iter().map(|id| Object::Reference(*id)).collect();
    let root = doc.get_object_mut(root_id)?.as_dict_mut()?;
    root.set("Kids", kids);
    root.set("Count", order.len() as i64);
    tracing::debug!(from, to, "moved page");

    save(doc)
}

/// Extract the inclusive page range `from..=to` into a new document.
pub fn collate_pages(bytes: &[u8], from: u32, to: u32) -> Result<Vec<u8>, PdfError> {
    let mut doc = document::load(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    if from == 0 || to > page_count || from > to {
        return Err(PdfError::InvalidPageRange { from, to });
    }

    let discard: Vec<u32> = (1..=page_count).filter(|p| *p < from || *p > to).collect();
    if !discard.is_empty() {
        doc.delete_pages(&discard);
        doc.prune_objects();
    }
    tracing::debug!(from, to, "collated page range");

    save(doc)
}

/// Split a page range into single-page documents.
///
/// Omitted bounds default to the whole document. Each result pairs the
/// source page number with the bytes of a one-page PDF.
pub fn split_pages(
    bytes: &[u8],
    from: Option<u32>,
    to: Option<u32>,
) -> Result<Vec<(u32, Vec<u8>)>, PdfError> {
    let doc = document::load(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    let from = from.unwrap_or(1);
    let to = to.unwrap_or(page_count);
    if from == 0 || to > page_count || from > to {
        return Err(PdfError::InvalidPageRange { from, to });
    }

    let mut parts = Vec::with_capacity((to - from + 1) as usize);
    for page in from..=to {
        let mut single = doc.clone();
        let discard: Vec<u32> = (1..=page_count).filter(|p| *p != page).collect();
        if !discard.is_empty() {
            single.delete_pages(&discard);
            single.prune_objects();
        }
        parts.push((page, save(single)?));
    }
    tracing::debug!(from, to, count = parts.len(), "split pages");

    Ok(parts)
}

/// Concatenate documents in order into one PDF.
pub fn merge_documents(inputs: &[Vec<u8>]) -> Result<Vec<u8>, PdfError> {
    if inputs.is_empty() {
        return Err(PdfError::EmptyDocument);
    }

    // Renumber each document past the previous one's ids, then stitch
    // the object tables together under a fresh catalog and pages root.
    let mut max_id = 1;
    let mut all_pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut all_objects: Vec<(ObjectId, Object)> = Vec::new();

    for bytes in inputs {
        let mut doc = document::load(bytes)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            all_pages.push((page_id, doc.get_object(page_id)?.clone()));
        }
        all_objects.extend(std::mem::take(&mut doc.objects));
    }

    if all_pages.is_empty() {
        return Err(PdfError::EmptyDocument);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut pages_root: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in all_objects {
        match object_type(&object).as_deref() {
            Some("Catalog") => {
                if catalog.is_none() {
                    catalog = object.as_dict().ok().map(|d| (object_id, d.clone()));
                }
            }
            Some("Pages") => {
                // Fold every intermediate pages node into one root
                if let Ok(dict) = object.as_dict() {
                    match pages_root.take() {
                        Some((root_id, mut existing)) => {
                            existing.extend(dict);
                            pages_root = Some((root_id, existing));
                        }
                        None => pages_root = Some((object_id, dict.clone())),
                    }
                }
            }
            // Pages are re-inserted below with a fixed parent; stale
            // outlines would point at dropped structure
            Some("Page") | Some("Outlines") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (root_id, mut root_dict) = pages_root.ok_or(PdfError::EmptyDocument)?;
    let (catalog_id, mut catalog_dict) = catalog.ok_or(PdfError::EmptyDocument)?;

    for (page_id, object) in &all_pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", root_id);
            merged.objects.insert(*page_id, Object::Dictionary(dict));
        }
    }

    root_dict.set("Count", all_pages.len() as i64);
    root_dict.set(
        "Kids",
        all_pages.iter().map(|(id, _)| Object::Reference(*id)).collect::<Vec<Object>>(),
    );
    merged.objects.insert(root_id, Object::Dictionary(root_dict));

    catalog_dict.set("Pages", root_id);
    catalog_dict.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = max_id;
    merged.renumber_objects();
    tracing::debug!(documents = inputs.len(), pages = all_pages.len(), "merged documents");

    save(merged)
}

fn object_type(object: &Object) -> Option<String> {
    let dict = object.as_dict().ok()?;
    let name = dict.get(b"Type").ok()?.as_name().ok()?;
    Some(String::from_utf8_lossy(name).into_owned())
}

fn save(mut doc: Document) -> Result<Vec<u8>, PdfError> {
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::pdf_with_pages;
    use lopdf::content::Content;

    /// Text label painted on a page by the fixture builder.
    fn page_label(bytes: &[u8], page: u32) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&page];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        content
            .operations
            .iter()
            .find(|op| op.operator == "Tj")
            .and_then(|op| op.operands[0].as_str().ok())
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .unwrap_or_default()
    }

    fn count_pages(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_rotate_sets_absolute_rotation() {
        let source = pdf_with_pages(2);
        let out = rotate_page(&source, 2, 450).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page_id = doc.get_pages()[&2];
        let rotate = doc.get_dictionary(page_id).unwrap().get(b"Rotate").unwrap();
        assert_eq!(rotate.as_i64().unwrap(), 90);
    }

    #[test]
    fn test_rotate_rejects_non_right_angles() {
        let source = pdf_with_pages(1);
        assert!(matches!(rotate_page(&source, 1, 45), Err(PdfError::InvalidRotation(45))));
    }

    #[test]
    fn test_rotate_rejects_missing_page() {
        let source = pdf_with_pages(2);
        assert!(matches!(
            rotate_page(&source, 3, 90),
            Err(PdfError::PageOutOfRange { page: 3, page_count: 2 })
        ));
        assert!(matches!(rotate_page(&source, 0, 90), Err(PdfError::PageOutOfRange { .. })));
    }

    #[test]
    fn test_move_page_reorders() {
        let source = pdf_with_pages(3);
        let out = move_page(&source, 3, 1).unwrap();

        assert_eq!(count_pages(&out), 3);
        assert_eq!(page_label(&out, 1), "Page 3");
        assert_eq!(page_label(&out, 2), "Page 1");
        assert_eq!(page_label(&out, 3), "Page 2");
    }

    #[test]
    fn test_move_page_onto_itself_is_identity() {
        let source = pdf_with_pages(3);
        let out = move_page(&source, 2, 2).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_move_page_validates_both_indices() {
        let source = pdf_with_pages(3);
        assert!(matches!(move_page(&source, 4, 1), Err(PdfError::PageOutOfRange { .. })));
        assert!(matches!(move_page(&source, 1, 0), Err(PdfError::PageOutOfRange { .. })));
    }

    #[test]
    fn test_collate_extracts_range() {
        let source = pdf_with_pages(4);
        let out = collate_pages(&source, 2, 3).unwrap();

        assert_eq!(count_pages(&out), 2);
        assert_eq!(page_label(&out, 1), "Page 2");
        assert_eq!(page_label(&out, 2), "Page 3");
    }

    #[test]
    fn test_collate_full_range_keeps_everything() {
        let source = pdf_with_pages(3);
        let out = collate_pages(&source, 1, 3).unwrap();
        assert_eq!(count_pages(&out), 3);
    }

    #[test]
    fn test_collate_rejects_bad_ranges() {
        let source = pdf_with_pages(3);
        assert!(matches!(collate_pages(&source, 3, 2), Err(PdfError::InvalidPageRange { .. })));
        assert!(matches!(collate_pages(&source, 0, 2), Err(PdfError::InvalidPageRange { .. })));
        assert!(matches!(collate_pages(&source, 2, 9), Err(PdfError::InvalidPageRange { .. })));
    }

    #[test]
    fn test_split_produces_one_document_per_page() {
        let source = pdf_with_pages(3);
        let parts = split_pages(&source, None, None).unwrap();

        assert_eq!(parts.len(), 3);
        for (page, bytes) in &parts {
            assert_eq!(count_pages(bytes), 1);
            assert_eq!(page_label(bytes, 1), format!("Page {page}"));
        }
    }

    #[test]
    fn test_split_honors_partial_range() {
        let source = pdf_with_pages(4);
        let parts = split_pages(&source, Some(2), Some(3)).unwrap();
        let numbers: Vec<u32> = parts.iter().map(|(page, _)| *page).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_split_rejects_bad_ranges() {
        let source = pdf_with_pages(3);
        assert!(matches!(
            split_pages(&source, Some(3), Some(1)),
            Err(PdfError::InvalidPageRange { .. })
        ));
        assert!(matches!(
            split_pages(&source, None, Some(4)),
            Err(PdfError::InvalidPageRange { .. })
        ));
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let first = pdf_with_pages(2);
        let second = pdf_with_pages(3);
        let out = merge_documents(&[first, second]).unwrap();

        assert_eq!(count_pages(&out), 5);
        assert_eq!(page_label(&out, 1), "Page 1");
        assert_eq!(page_label(&out, 2), "Page 2");
        assert_eq!(page_label(&out, 3), "Page 1");
        assert_eq!(page_label(&out, 5), "Page 3");
    }

    #[test]
    fn test_merge_of_nothing_is_an_error() {
        assert!(matches!(merge_documents(&[]), Err(PdfError::EmptyDocument)));
    }

    #[test]
    fn test_merge_single_document_round_trips() {
        let source = pdf_with_pages(2);
        let out = merge_documents(std::slice::from_ref(&source)).unwrap();
        assert_eq!(count_pages(&out), 2);
    }
}
