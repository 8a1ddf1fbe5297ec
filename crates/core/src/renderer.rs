//! Annotation renderer
//!
//! Builds a deterministic display list of scaled primitives for one
//! page, then optionally rasterizes the vector primitives onto an
//! RGBA overlay. Rendering is pure: the same annotations and scale
//! always produce the same primitives and the same pixels, so the
//! host can redraw on every store mutation or zoom change.
//!
//! Text runs appear in the display list with full layout (word wrap,
//! per-line underlines); glyph rasterization itself is left to the
//! host's text stack.

use crate::annotation::{Annotation, AnnotationBody, Color, TextStyle};
use crate::editor::Gesture;
use crate::geometry::{Point, Rect};
use crate::text_layout::{self, LINE_HEIGHT, TEXT_INSET};

/// Opacity applied to highlight strokes.
pub const HIGHLIGHT_OPACITY: f32 = 0.4;

/// Resolved font for a laid-out text line
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Font size in output units (already scaled)
    pub size: f32,
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

/// A draw command in output (scaled) coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// One stroke segment with round caps
    Stroke {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
        opacity: f32,
    },

    /// One laid-out line of text, anchored at its top-left corner
    TextLine {
        origin: Point,
        text: String,
        font: FontSpec,
        color: Color,
    },

    /// Underline segment beneath a text line
    Underline {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
    },

    /// Dashed outline (text-box drag preview)
    DashedBox {
        bounds: Rect,
        color: Color,
        width: f32,
        dash: [f32; 2],
    },
}

/// Build the display list for one page's annotations at a scale factor.
pub fn scene_for_page<'a>(
    annotations: impl IntoIterator<Item = &'a Annotation>,
    scale: f32,
) -> Vec<Primitive> {
    let mut primitives = Vec::new();
    for annotation in annotations {
        match annotation.body() {
            AnnotationBody::Draw { points, stroke_width } => {
                push_stroke(&mut primitives, points, annotation.color(), *stroke_width, 1.0, scale);
            }
            AnnotationBody::Highlight { points, stroke_width } => {
                push_stroke(
                    &mut primitives,
                    points,
                    annotation.color(),
                    *stroke_width,
                    HIGHLIGHT_OPACITY,
                    scale,
                );
            }
            AnnotationBody::Text { origin, width, text, style, .. } => {
                push_text(&mut primitives, *origin, *width, text, style, annotation.color(), scale);
            }
        }
    }
    primitives
}

/// Overlay primitives for the in-flight gesture (text-box preview).
///
/// In-progress stroke segments are painted incrementally by the host
/// from `GestureUpdate::StrokeExtended`, so only the dashed preview
/// rectangle needs a primitive here.
pub fn gesture_overlay(gesture: &Gesture, scale: f32) -> Vec<Primitive> {
    match gesture {
        Gesture::DrawingTextBox { anchor, cursor } => {
            let bounds = Rect::from_drag(*anchor, *cursor, 0.0, 0.0);
            vec![Primitive::DashedBox {
                bounds: Rect::new(
                    bounds.x * scale,
                    bounds.y * scale,
                    bounds.width * scale,
                    bounds.height * scale,
                ),
                color: Color::RED,
                width: 2.0,
                dash: [5.0, 5.0],
            }]
        }
        _ => Vec::new(),
    }
}

fn push_stroke(
    primitives: &mut Vec<Primitive>,
    points: &[Point],
    color: Color,
    stroke_width: f32,
    opacity: f32,
    scale: f32,
) {
    for pair in points.windows(2) {
        primitives.push(Primitive::Stroke {
            from: pair[0].scaled(scale),
            to: pair[1].scaled(scale),
            color,
            width: stroke_width * scale,
            opacity,
        });
    }
}

fn push_text(
    primitives: &mut Vec<Primitive>,
    origin: Point,
    box_width: f32,
    text: &str,
    style: &TextStyle,
    color: Color,
    scale: f32,
) {
    let wrap_width = box_width - 2.0 * TEXT_INSET;
    let lines = text_layout::wrap(text, wrap_width, style.font_size);
    let line_height = style.font_size * LINE_HEIGHT;
    let x = origin.x + TEXT_INSET;
    let mut y = origin.y + TEXT_INSET;

    for line in lines {
        primitives.push(Primitive::TextLine {
            origin: Point::new(x, y).scaled(scale),
            text: line.clone(),
            font: FontSpec {
                size: style.font_size * scale,
                family: style.font_family.clone(),
                bold: style.bold,
                italic: style.italic,
            },
            color,
        });

        if style.underline {
            let measured = text_layout::measure_width(&line, style.font_size);
            let baseline = y + style.font_size;
            primitives.push(Primitive::Underline {
                from: Point::new(x, baseline).scaled(scale),
                to: Point::new(x + measured, baseline).scaled(scale),
                color,
                width: 1.0 * scale,
            });
        }

        y += line_height;
    }
}

/// Rasterize vector primitives onto a transparent RGBA overlay.
///
/// Strokes, underlines and dashed boxes are painted; `TextLine`
/// primitives are skipped (glyphs are the host's concern).
pub fn rasterize(primitives: &[Primitive], width_px: u32, height_px: u32) -> image::RgbaImage {
    let mut overlay = image::RgbaImage::from_pixel(
        width_px.max(1),
        height_px.max(1),
        image::Rgba([0, 0, 0, 0]),
    );

    for primitive in primitives {
        match primitive {
            Primitive::Stroke { from, to, color, width, opacity } => {
                paint_segment(&mut overlay, *from, *to, *color, *width, *opacity);
            }
            Primitive::Underline { from, to, color, width } => {
                paint_segment(&mut overlay, *from, *to, *color, *width, 1.0);
            }
            Primitive::DashedBox { bounds, color, width, dash } => {
                paint_dashed_box(&mut overlay, *bounds, *color, *width, *dash);
            }
            Primitive::TextLine { .. } => {}
        }
    }

    overlay
}

/// Paint one segment as a capsule (round caps) via per-pixel coverage.
fn paint_segment(
    overlay: &mut image::RgbaImage,
    from: Point,
    to: Point,
    color: Color,
    width: f32,
    opacity: f32,
) {
    let half = (width / 2.0).max(0.5);
    let min_x = (from.x.min(to.x) - half).floor().max(0.0) as u32;
    let min_y = (from.y.min(to.y) - half).floor().max(0.0) as u32;
    let max_x = ((from.x.max(to.x) + half).ceil() as u32).min(overlay.width().saturating_sub(1));
    let max_y = ((from.y.max(to.y) + half).ceil() as u32).min(overlay.height().saturating_sub(1));

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let center = Point::new(px as f32 + 0.5, py as f32 + 0.5);
            if crate::geometry::distance_to_segment(center, from, to) <= half {
                blend_pixel(overlay.get_pixel_mut(px, py), color, opacity);
            }
        }
    }
}

fn paint_dashed_box(
    overlay: &mut image::RgbaImage,
    bounds: Rect,
    color: Color,
    width: f32,
    dash: [f32; 2],
) {
    let corners = [
        (Point::new(bounds.x, bounds.y), Point::new(bounds.x + bounds.width, bounds.y)),
        (
            Point::new(bounds.x + bounds.width, bounds.y),
            Point::new(bounds.x + bounds.width, bounds.y + bounds.height),
        ),
        (
            Point::new(bounds.x + bounds.width, bounds.y + bounds.height),
            Point::new(bounds.x, bounds.y + bounds.height),
        ),
        (Point::new(bounds.x, bounds.y + bounds.height), Point::new(bounds.x, bounds.y)),
    ];

    let period = dash[0] + dash[1];
    for (start, end) in corners {
        let length = start.distance_to(&end);
        if length < f32::EPSILON {
            continue;
        }
        let mut offset = 0.0;
        while offset < length {
            let dash_end = (offset + dash[0]).min(length);
            let t0 = offset / length;
            let t1 = dash_end / length;
            let from = Point::new(
                start.x + (end.x - start.x) * t0,
                start.y + (end.y - start.y) * t0,
            );
            let to = Point::new(
                start.x + (end.x - start.x) * t1,
                start.y + (end.y - start.y) * t1,
            );
            paint_segment(overlay, from, to, color, width, 1.0);
            offset += period;
        }
    }
}

fn blend_pixel(pixel: &mut image::Rgba<u8>, color: Color, opacity: f32) {
    let alpha = opacity.clamp(0.0, 1.0);
    let blend = |src: u8, dst: u8| -> u8 {
        (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8
    };
    pixel.0 = [
        blend(color.r, pixel.0[0]),
        blend(color.g, pixel.0[1]),
        blend(color.b, pixel.0[2]),
        blend(255, pixel.0[3]),
    ];
}
