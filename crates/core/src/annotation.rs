//! Annotation data model
//!
//! Annotations are immutable once created: to correct one, delete it
//! and add a replacement. Geometry is stored in document space
//! (unscaled, top-left origin) and only converted to PDF page space at
//! export time.

use crate::geometry::{distance_to_segment, Point, Rect};

/// Unique identifier for an annotation
///
/// Assigned at creation time and never reused.
pub type AnnotationId = uuid::Uuid;

/// Hit-test slop for erasing strokes, in document-space units.
///
/// The effective eraser threshold is `max(stroke_width, ERASER_SLOP)`
/// so thin strokes stay erasable. This is a usability policy, not a
/// rendering rule.
pub const ERASER_SLOP: f32 = 15.0;

/// Opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    /// Create a new color
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Format as a `#rrggbb` hex string.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Convert to normalized RGB values (0.0 to 1.0)
    pub fn to_normalized(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid hex color {value:?}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Text formatting for text annotations
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Font size in document-space units
    pub font_size: f32,

    /// Font family name
    pub font_family: String,

    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            font_family: "Arial".to_string(),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// Kind of annotation (for filtering and display)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Text,
    Highlight,
    Draw,
}

/// Immutable annotation geometry and content
///
/// The per-kind invariants hold by construction: stroke kinds carry a
/// point list, text carries exactly one anchor point plus its box size.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationBody {
    /// Freehand stroke
    Draw { points: Vec<Point>, stroke_width: f32 },

    /// Highlight stroke, rendered at reduced opacity
    Highlight { points: Vec<Point>, stroke_width: f32 },

    /// Text box anchored at its top-left corner
    Text {
        origin: Point,
        width: f32,
        height: f32,
        text: String,
        style: TextStyle,
    },
}

impl AnnotationBody {
    /// Bounding box as (min_x, min_y, max_x, max_y) in document space.
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        match self {
            AnnotationBody::Draw { points, .. } | AnnotationBody::Highlight { points, .. } => {
                if points.is_empty() {
                    return (0.0, 0.0, 0.0, 0.0);
                }
                let mut min_x = points[0].x;
                let mut max_x = points[0].x;
                let mut min_y = points[0].y;
                let mut max_y = points[0].y;
                for point in points.iter().skip(1) {
                    min_x = min_x.min(point.x);
                    max_x = max_x.max(point.x);
                    min_y = min_y.min(point.y);
                    max_y = max_y.max(point.y);
                }
                (min_x, min_y, max_x, max_y)
            }
            AnnotationBody::Text { origin, width, height, .. } => {
                (origin.x, origin.y, origin.x + width, origin.y + height)
            }
        }
    }

    /// Check whether a point hits this body (for erasing).
    pub fn contains_point(&self, point: Point) -> bool {
        match self {
            AnnotationBody::Draw { points, stroke_width }
            | AnnotationBody::Highlight { points, stroke_width } => {
                let threshold = stroke_width.max(ERASER_SLOP);
                points
                    .windows(2)
                    .any(|pair| distance_to_segment(point, pair[0], pair[1]) <= threshold)
            }
            AnnotationBody::Text { origin, width, height, .. } => {
                Rect::new(origin.x, origin.y, *width, *height).contains(point)
            }
        }
    }
}

/// A user-added mark on one page
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    id: AnnotationId,

    /// 1-indexed page this annotation belongs to
    page_number: u16,

    /// Stroke color for draw/highlight, text color for text
    color: Color,

    #[serde(flatten)]
    body: AnnotationBody,
}

impl Annotation {
    /// Create a freehand stroke annotation.
    pub fn draw(page_number: u16, points: Vec<Point>, color: Color, stroke_width: f32) -> Self {
        debug_assert!(!points.is_empty(), "draw annotations need at least one point");
        Self {
            id: AnnotationId::new_v4(),
            page_number,
            color,
            body: AnnotationBody::Draw { points, stroke_width },
        }
    }

    /// Create a highlight stroke annotation.
    pub fn highlight(
        page_number: u16,
        points: Vec<Point>,
        color: Color,
        stroke_width: f32,
    ) -> Self {
        debug_assert!(!points.is_empty(), "highlight annotations need at least one point");
        Self {
            id: AnnotationId::new_v4(),
            page_number,
            color,
            body: AnnotationBody::Highlight { points, stroke_width },
        }
    }

    /// Create a text annotation occupying the given box.
    pub fn text(
        page_number: u16,
        bounds: Rect,
        text: String,
        style: TextStyle,
        color: Color,
    ) -> Self {
        Self {
            id: AnnotationId::new_v4(),
            page_number,
            color,
            body: AnnotationBody::Text {
                origin: bounds.origin(),
                width: bounds.width,
                height: bounds.height,
                text,
                style,
            },
        }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    /// 1-indexed page number; immutable after creation.
    pub fn page_number(&self) -> u16 {
        self.page_number
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn body(&self) -> &AnnotationBody {
        &self.body
    }

    pub fn kind(&self) -> AnnotationKind {
        match self.body {
            AnnotationBody::Draw { .. } => AnnotationKind::Draw,
            AnnotationBody::Highlight { .. } => AnnotationKind::Highlight,
            AnnotationBody::Text { .. } => AnnotationKind::Text,
        }
    }

    /// Bounding box in document space.
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        self.body.bounding_box()
    }

    /// Check if a point hits this annotation (eraser support).
    pub fn hit_test(&self, point: Point) -> bool {
        self.body.contains_point(point)
    }
}
