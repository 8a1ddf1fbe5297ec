//! Flattened annotation export
//!
//! Appends annotation geometry to each page's content stream so the
//! marks survive in any PDF viewer, with no dependence on viewer
//! annotation support. Document space (top-left origin, y down) is
//! converted to PDF page space (bottom-left origin, y up) here and
//! nowhere else.

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use marginalia_core::annotation::{Annotation, AnnotationBody, Color, TextStyle};
use marginalia_core::geometry::Point;
use marginalia_core::renderer::HIGHLIGHT_OPACITY;
use marginalia_core::text_layout::{self, LINE_HEIGHT, TEXT_INSET};

use crate::document::{self, PageSize};
use crate::PdfError;

const HIGHLIGHT_GS_NAME: &str = "GShl";

/// Bake annotations into page content streams and return the new PDF.
///
/// Annotations whose page number does not exist in the document are
/// skipped with a warning; everything else is flattened. The returned
/// bytes are a complete standalone document.
pub fn export_with_annotations(
    bytes: &[u8],
    annotations: &[Annotation],
) -> Result<Vec<u8>, PdfError> {
    let mut doc = document::load(bytes)?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(PdfError::EmptyDocument);
    }
    let page_count = pages.len() as u32;

    let mut by_page: BTreeMap<u32, Vec<&Annotation>> = BTreeMap::new();
    for annotation in annotations {
        let page = u32::from(annotation.page_number());
        if pages.contains_key(&page) {
            by_page.entry(page).or_default().push(annotation);
        } else {
            tracing::warn!(page, page_count, "skipping annotation on missing page");
        }
    }

    let mut shared = SharedObjects::default();

    for (page, page_annotations) in by_page {
        let page_id = pages[&page];
        let height = page_height(&doc, page_id)?;

        let mut ops = Vec::new();
        let mut used = PageResources::default();
        for annotation in &page_annotations {
            append_annotation_ops(&mut ops, &mut doc, &mut shared, &mut used, annotation, height);
        }
        if ops.is_empty() {
            continue;
        }

        let existing = doc.get_page_content(page_id)?;
        let mut content = Content::decode(&existing)?;
        content.operations.push(Operation::new("q", vec![]));
        content.operations.extend(ops);
        content.operations.push(Operation::new("Q", vec![]));
        let encoded = content.encode()?;
        doc.change_page_content(page_id, encoded)?;

        upsert_resources(&mut doc, page_id, &used)?;
        tracing::debug!(page, count = page_annotations.len(), "flattened annotations");
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Font and graphics-state objects shared by every page of one export.
#[derive(Debug, Default)]
struct SharedObjects {
    fonts: BTreeMap<&'static str, ObjectId>,
    highlight_gs: Option<ObjectId>,
}

impl SharedObjects {
    fn font(&mut self, doc: &mut Document, style: &TextStyle) -> (&'static str, ObjectId) {
        // Text styles name host fonts like Arial; the flattened output
        // uses the matching base-14 Helvetica variant.
        let (name, base_font) = match (style.bold, style.italic) {
            (false, false) => ("FHv", "Helvetica"),
            (true, false) => ("FHvB", "Helvetica-Bold"),
            (false, true) => ("FHvO", "Helvetica-Oblique"),
            (true, true) => ("FHvBO", "Helvetica-BoldOblique"),
        };
        let id = *self.fonts.entry(name).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base_font,
            })
        });
        (name, id)
    }

    fn highlight_gs(&mut self, doc: &mut Document) -> (&'static str, ObjectId) {
        let id = *self.highlight_gs.get_or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => HIGHLIGHT_OPACITY,
                "CA" => HIGHLIGHT_OPACITY,
            })
        });
        (HIGHLIGHT_GS_NAME, id)
    }
}

/// Resource names one page's appended content refers to
#[derive(Debug, Default)]
struct PageResources {
    fonts: Vec<(&'static str, ObjectId)>,
    highlight_gs: Option<(&'static str, ObjectId)>,
}

impl PageResources {
    fn note_font(&mut self, name: &'static str, id: ObjectId) {
        if !self.fonts.iter().any(|(n, _)| *n == name) {
            self.fonts.push((name, id));
        }
    }
}

fn append_annotation_ops(
    ops: &mut Vec<Operation>,
    doc: &mut Document,
    shared: &mut SharedObjects,
    used: &mut PageResources,
    annotation: &Annotation,
    page_height: f32,
) {
    match annotation.body() {
        AnnotationBody::Draw { points, stroke_width } => {
            append_stroke_ops(ops, points, annotation.color(), *stroke_width, page_height, None);
        }
        AnnotationBody::Highlight { points, stroke_width } => {
            let (gs_name, gs_id) = shared.highlight_gs(doc);
            used.highlight_gs = Some((gs_name, gs_id));
            append_stroke_ops(
                ops,
                points,
                annotation.color(),
                *stroke_width,
                page_height,
                Some(gs_name),
            );
        }
        AnnotationBody::Text { origin, width, text, style, .. } => {
            let (font_name, font_id) = shared.font(doc, style);
            used.note_font(font_name, font_id);
            append_text_ops(
                ops,
                *origin,
                *width,
                text,
                style,
                annotation.color(),
                page_height,
                font_name,
            );
        }
    }
}

/// One polyline stroke with round caps and joins.
fn append_stroke_ops(
    ops: &mut Vec<Operation>,
    points: &[Point],
    color: Color,
    stroke_width: f32,
    page_height: f32,
    gs_name: Option<&str>,
) {
    // A single point has no segments to stroke
    if points.len() < 2 {
        return;
    }

    let (r, g, b) = color.to_normalized();
    ops.push(Operation::new("q", vec![]));
    if let Some(name) = gs_name {
        ops.push(Operation::new("gs", vec![name.into()]));
    }
    ops.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
    ops.push(Operation::new("w", vec![stroke_width.into()]));
    ops.push(Operation::new("J", vec![1.into()]));
    ops.push(Operation::new("j", vec![1.into()]));

    ops.push(Operation::new(
        "m",
        vec![points[0].x.into(), (page_height - points[0].y).into()],
    ));
    for point in points.iter().skip(1) {
        ops.push(Operation::new("l", vec![point.x.into(), (page_height - point.y).into()]));
    }
    ops.push(Operation::new("S", vec![]));
    ops.push(Operation::new("Q", vec![]));
}

/// Wrapped text lines with optional per-line underlines.
///
/// Uses the same wrap and width estimate as the on-screen renderer so
/// line breaks in the export match what the user saw.
#[allow(clippy::too_many_arguments)]
fn append_text_ops(
    ops: &mut Vec<Operation>,
    origin: Point,
    box_width: f32,
    text: &str,
    style: &TextStyle,
    color: Color,
    page_height: f32,
    font_name: &str,
) {
    let wrap_width = box_width - 2.0 * TEXT_INSET;
    let lines = text_layout::wrap(text, wrap_width, style.font_size);
    if lines.is_empty() {
        return;
    }

    let (r, g, b) = color.to_normalized();
    let line_height = style.font_size * LINE_HEIGHT;
    let x = origin.x + TEXT_INSET;

    ops.push(Operation::new("q", vec![]));
    for (index, line) in lines.iter().enumerate() {
        let top = origin.y + TEXT_INSET + index as f32 * line_height;
        let baseline = page_height - (top + style.font_size);

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font_name.into(), style.font_size.into()]));
        ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        ops.push(Operation::new("ET", vec![]));

        if style.underline {
            let width = text_layout::measure_width(line, style.font_size);
            let underline_y = baseline - 2.0;
            ops.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
            ops.push(Operation::new("w", vec![1.into()]));
            ops.push(Operation::new("m", vec![x.into(), underline_y.into()]));
            ops.push(Operation::new("l", vec![(x + width).into(), underline_y.into()]));
            ops.push(Operation::new("S", vec![]));
        }
    }
    ops.push(Operation::new("Q", vec![]));
}

/// Page height from the effective MediaBox (walking /Parent for
/// inherited boxes), falling back to US Letter.
fn page_height(doc: &Document, page_id: ObjectId) -> Result<f32, PdfError> {
    let mut current = page_id;
    loop {
        let dict = doc.get_dictionary(current)?;
        let media_box = match dict.get(b"MediaBox") {
            Ok(Object::Array(array)) => Some(array.clone()),
            Ok(Object::Reference(id)) => {
                Some(doc.get_object(*id)?.as_array()?.clone())
            }
            _ => None,
        };
        if let Some(array) = media_box {
            if array.len() == 4 {
                let y0 = array[1].as_float()?;
                let y1 = array[3].as_float()?;
                return Ok((y1 - y0).abs());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => current = *id,
            _ => return Ok(PageSize::LETTER.height_pt),
        }
    }
}

/// Merge the fonts and graphics states our content refers to into the
/// page's effective resources, writing the result inline on the page.
fn upsert_resources(
    doc: &mut Document,
    page_id: ObjectId,
    used: &PageResources,
) -> Result<(), PdfError> {
    let mut resources = resolved_resources(doc, page_id)?;

    if !used.fonts.is_empty() {
        let mut font_dict = sub_dictionary(doc, &resources, b"Font")?;
        for (name, id) in &used.fonts {
            font_dict.set(*name, Object::Reference(*id));
        }
        resources.set("Font", Object::Dictionary(font_dict));
    }

    if let Some((name, id)) = used.highlight_gs {
        let mut gs_dict = sub_dictionary(doc, &resources, b"ExtGState")?;
        gs_dict.set(name, Object::Reference(id));
        resources.set("ExtGState", Object::Dictionary(gs_dict));
    }

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Effective resources for a page: its own /Resources, or the nearest
/// inherited one up the /Parent chain, cloned for editing.
fn resolved_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary, PdfError> {
    let mut current = page_id;
    loop {
        let dict = doc.get_dictionary(current)?;
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return Ok(resources.clone()),
            Ok(Object::Reference(id)) => return Ok(doc.get_dictionary(*id)?.clone()),
            _ => {}
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(id)) => current = *id,
            _ => return Ok(Dictionary::new()),
        }
    }
}

fn sub_dictionary(
    doc: &Document,
    resources: &Dictionary,
    key: &[u8],
) -> Result<Dictionary, PdfError> {
    match resources.get(key) {
        Ok(Object::Dictionary(dict)) => Ok(dict.clone()),
        Ok(Object::Reference(id)) => Ok(doc.get_dictionary(*id)?.clone()),
        _ => Ok(Dictionary::new()),
    }
}
