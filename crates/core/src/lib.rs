//! Marginalia annotation core
//!
//! In-memory annotation model, hit-testing, input state machine and
//! renderer for the PDF annotation editor. All coordinates are in
//! document space (unscaled, origin at the page's top-left corner);
//! the PDF serializer in `marginalia-pdf` performs the flip into PDF
//! page space on export.

pub mod annotation;
pub mod editor;
pub mod geometry;
pub mod renderer;
pub mod store;
pub mod text_layout;
pub mod tools;

pub use annotation::{Annotation, AnnotationBody, AnnotationId, AnnotationKind, Color, TextStyle};
pub use editor::{AnnotationEditor, Gesture, GestureUpdate};
pub use geometry::{distance_to_segment, Point, Rect};
pub use renderer::{gesture_overlay, rasterize, scene_for_page, FontSpec, Primitive};
pub use store::AnnotationStore;
pub use tools::{Tool, ToolSettings};
