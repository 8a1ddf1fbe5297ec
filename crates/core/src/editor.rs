//! Pointer input state machine
//!
//! Converts pointer-down/move/up events into draw paths, text-box
//! bounds, or erase actions depending on the active tool. Exactly one
//! gesture is in flight at a time; the gesture is a single enum value,
//! so invalid flag combinations ("erasing" while "creating a text
//! box") cannot be represented.
//!
//! Pointer positions arrive in canvas space (already converted from
//! screen space by the caller) and are divided by the current scale
//! factor on entry, so everything downstream works in document space.

use crate::annotation::{Annotation, AnnotationId};
use crate::geometry::{Point, Rect};
use crate::store::AnnotationStore;
use crate::tools::{Tool, ToolSettings};

/// Width floor for a committed text box, in document-space units.
pub const TEXT_BOX_MIN_WIDTH: f32 = 100.0;

/// Height floor for a committed text box, in document-space units.
pub const TEXT_BOX_MIN_HEIGHT: f32 = 30.0;

/// The gesture currently in flight
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// No gesture in progress
    Idle,

    /// Accumulating a freehand/highlight path (points in document space)
    DrawingPath { tool: Tool, points: Vec<Point> },

    /// Dragging out a text box from an anchor corner
    DrawingTextBox { anchor: Point, cursor: Point },

    /// Text box committed, awaiting text input
    TextInputActive { bounds: Rect },

    /// Eraser held down, removing on every position
    Erasing,
}

/// What an input event did, so the host can paint incrementally
#[derive(Debug, Clone, PartialEq)]
pub enum GestureUpdate {
    /// Input consumed with no visible effect (or ignored outright)
    Ignored,

    /// A new stroke began at this document-space position
    StrokeStarted { at: Point },

    /// The in-progress stroke grew by one segment
    StrokeExtended { from: Point, to: Point },

    /// The dashed text-box preview should be drawn at these bounds
    TextBoxPreview { bounds: Rect },

    /// The text box was sized; surface a text input at these bounds
    TextBoxReady { bounds: Rect },

    /// A completed annotation was appended to the store
    Committed(AnnotationId),

    /// An annotation was removed by the eraser
    Erased(AnnotationId),

    /// The gesture ended without committing anything
    GestureEnded,
}

/// Owner of the annotation store and the input state machine
///
/// Single-writer by construction: all mutation of the store flows
/// through this controller on the one UI thread.
#[derive(Debug)]
pub struct AnnotationEditor {
    store: AnnotationStore,
    settings: ToolSettings,
    tool: Option<Tool>,
    page_number: u16,
    scale: f32,
    gesture: Gesture,
}

impl AnnotationEditor {
    /// Create an editor for the given 1-indexed page at scale 1.0.
    pub fn new(page_number: u16) -> Self {
        Self {
            store: AnnotationStore::new(),
            settings: ToolSettings::default(),
            tool: None,
            page_number,
            scale: 1.0,
            gesture: Gesture::Idle,
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn page_number(&self) -> u16 {
        self.page_number
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Update the zoom ratio used to unscale incoming pointer positions.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = if scale > 0.0 { scale } else { 1.0 };
    }

    /// Switch the active tool. Ignored while a gesture is in flight
    /// (returns false); the current gesture completes with the tool it
    /// started with.
    pub fn set_tool(&mut self, tool: Option<Tool>) -> bool {
        if self.gesture != Gesture::Idle {
            return false;
        }
        if let Some(tool) = tool {
            self.settings.select_tool_defaults(tool);
        }
        self.tool = tool;
        true
    }

    /// Switch the current page. Ignored while a gesture is in flight.
    pub fn set_page(&mut self, page_number: u16) -> bool {
        if self.gesture != Gesture::Idle {
            return false;
        }
        self.page_number = page_number;
        true
    }

    /// Drop all annotations and any in-flight gesture (the underlying
    /// document changed).
    pub fn reset_for_document(&mut self, page_number: u16) {
        self.store.clear();
        self.gesture = Gesture::Idle;
        self.page_number = page_number;
    }

    /// Pointer pressed at a canvas-space position.
    pub fn pointer_down(&mut self, position: Point) -> GestureUpdate {
        if self.gesture != Gesture::Idle {
            return GestureUpdate::Ignored;
        }
        let Some(tool) = self.tool else {
            return GestureUpdate::Ignored;
        };

        let pos = position.unscaled(self.scale);
        match tool {
            Tool::Draw | Tool::Highlight => {
                self.gesture = Gesture::DrawingPath { tool, points: vec![pos] };
                GestureUpdate::StrokeStarted { at: pos }
            }
            Tool::Text => {
                self.gesture = Gesture::DrawingTextBox { anchor: pos, cursor: pos };
                GestureUpdate::TextBoxPreview { bounds: Rect::from_drag(pos, pos, 0.0, 0.0) }
            }
            Tool::Eraser => {
                self.gesture = Gesture::Erasing;
                match self.erase_at(pos) {
                    Some(id) => GestureUpdate::Erased(id),
                    None => GestureUpdate::Ignored,
                }
            }
        }
    }

    /// Pointer moved to a canvas-space position.
    pub fn pointer_move(&mut self, position: Point) -> GestureUpdate {
        let pos = position.unscaled(self.scale);
        match &mut self.gesture {
            Gesture::DrawingPath { points, .. } => {
                // points is non-empty from pointer_down onward
                let from = *points.last().unwrap_or(&pos);
                points.push(pos);
                GestureUpdate::StrokeExtended { from, to: pos }
            }
            Gesture::DrawingTextBox { anchor, cursor } => {
                *cursor = pos;
                GestureUpdate::TextBoxPreview {
                    bounds: Rect::from_drag(*anchor, pos, 0.0, 0.0),
                }
            }
            Gesture::Erasing => match self.erase_at(pos) {
                Some(id) => GestureUpdate::Erased(id),
                None => GestureUpdate::Ignored,
            },
            Gesture::Idle | Gesture::TextInputActive { .. } => GestureUpdate::Ignored,
        }
    }

    /// Pointer released.
    pub fn pointer_up(&mut self) -> GestureUpdate {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::DrawingPath { tool, points } => {
                if points.is_empty() {
                    return GestureUpdate::GestureEnded;
                }
                let annotation = match tool {
                    Tool::Highlight => Annotation::highlight(
                        self.page_number,
                        points,
                        self.settings.color,
                        self.settings.stroke_width,
                    ),
                    _ => Annotation::draw(
                        self.page_number,
                        points,
                        self.settings.color,
                        self.settings.stroke_width,
                    ),
                };
                let id = annotation.id();
                self.store.add(annotation);
                GestureUpdate::Committed(id)
            }
            Gesture::DrawingTextBox { anchor, cursor } => {
                let bounds =
                    Rect::from_drag(anchor, cursor, TEXT_BOX_MIN_WIDTH, TEXT_BOX_MIN_HEIGHT);
                self.gesture = Gesture::TextInputActive { bounds };
                GestureUpdate::TextBoxReady { bounds }
            }
            Gesture::Erasing => GestureUpdate::GestureEnded,
            Gesture::TextInputActive { bounds } => {
                // Release while the text input is open keeps it open
                self.gesture = Gesture::TextInputActive { bounds };
                GestureUpdate::Ignored
            }
            Gesture::Idle => GestureUpdate::Ignored,
        }
    }

    /// Submit text for the pending text box (explicit confirm or
    /// focus loss). Empty or whitespace-only input discards the box.
    pub fn submit_text(&mut self, text: &str) -> GestureUpdate {
        let Gesture::TextInputActive { bounds } = self.gesture else {
            return GestureUpdate::Ignored;
        };
        self.gesture = Gesture::Idle;

        if text.trim().is_empty() {
            return GestureUpdate::GestureEnded;
        }

        let annotation = Annotation::text(
            self.page_number,
            bounds,
            text.to_string(),
            self.settings.text.clone(),
            self.settings.text_color,
        );
        let id = annotation.id();
        self.store.add(annotation);
        GestureUpdate::Committed(id)
    }

    /// Cancel the pending text box without committing.
    pub fn cancel_text_input(&mut self) -> GestureUpdate {
        if matches!(self.gesture, Gesture::TextInputActive { .. }) {
            self.gesture = Gesture::Idle;
            GestureUpdate::GestureEnded
        } else {
            GestureUpdate::Ignored
        }
    }

    /// Abandon the in-flight gesture (pointer left the canvas).
    /// Uncommitted paths and boxes are discarded, never committed.
    pub fn cancel_gesture(&mut self) -> GestureUpdate {
        if self.gesture == Gesture::Idle {
            return GestureUpdate::Ignored;
        }
        self.gesture = Gesture::Idle;
        GestureUpdate::GestureEnded
    }

    fn erase_at(&mut self, pos: Point) -> Option<AnnotationId> {
        let id = self.store.hit_first(self.page_number, pos)?.id();
        self.store.remove(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationBody, Color};

    fn editor_with_tool(tool: Tool) -> AnnotationEditor {
        let mut editor = AnnotationEditor::new(1);
        assert!(editor.set_tool(Some(tool)));
        editor
    }

    #[test]
    fn test_draw_gesture_commits_path() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.settings_mut().color = Color::from_hex("#ff0000").unwrap();
        editor.settings_mut().stroke_width = 3.0;

        editor.pointer_down(Point::new(10.0, 10.0));
        editor.pointer_move(Point::new(20.0, 10.0));
        editor.pointer_move(Point::new(20.0, 20.0));
        let update = editor.pointer_up();

        let GestureUpdate::Committed(id) = update else {
            panic!("expected commit, got {update:?}");
        };
        assert_eq!(editor.store().len(), 1);
        let annotation = editor.store().get(id).unwrap();
        assert_eq!(annotation.page_number(), 1);
        assert_eq!(annotation.color(), Color::RED);
        match annotation.body() {
            AnnotationBody::Draw { points, stroke_width } => {
                assert_eq!(
                    points,
                    &vec![
                        Point::new(10.0, 10.0),
                        Point::new(20.0, 10.0),
                        Point::new(20.0, 20.0)
                    ]
                );
                assert_eq!(*stroke_width, 3.0);
            }
            other => panic!("expected draw body, got {other:?}"),
        }
    }

    #[test]
    fn test_single_click_still_commits_one_point_path() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.pointer_down(Point::new(5.0, 5.0));
        assert!(matches!(editor.pointer_up(), GestureUpdate::Committed(_)));
        assert_eq!(editor.store().len(), 1);
    }

    #[test]
    fn test_positions_are_unscaled_into_document_space() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.set_scale(2.0);

        editor.pointer_down(Point::new(20.0, 40.0));
        editor.pointer_up();

        let annotation = editor.store().iter().next().unwrap();
        match annotation.body() {
            AnnotationBody::Draw { points, .. } => {
                assert_eq!(points[0], Point::new(10.0, 20.0));
            }
            other => panic!("expected draw body, got {other:?}"),
        }
    }

    #[test]
    fn test_highlight_commits_highlight_body() {
        let mut editor = editor_with_tool(Tool::Highlight);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(50.0, 0.0));
        editor.pointer_up();

        let annotation = editor.store().iter().next().unwrap();
        assert!(matches!(annotation.body(), AnnotationBody::Highlight { .. }));
        // Tool switch applied the highlight defaults
        assert_eq!(annotation.color(), Color::YELLOW);
    }

    #[test]
    fn test_zero_size_text_drag_clamps_box() {
        let mut editor = editor_with_tool(Tool::Text);

        editor.pointer_down(Point::new(5.0, 5.0));
        let update = editor.pointer_up();

        let GestureUpdate::TextBoxReady { bounds } = update else {
            panic!("expected text box, got {update:?}");
        };
        assert_eq!(bounds, Rect::new(5.0, 5.0, 100.0, 30.0));

        let update = editor.submit_text("hello");
        let GestureUpdate::Committed(id) = update else {
            panic!("expected commit, got {update:?}");
        };
        match editor.store().get(id).unwrap().body() {
            AnnotationBody::Text { origin, width, height, text, .. } => {
                assert_eq!(*origin, Point::new(5.0, 5.0));
                assert_eq!(*width, 100.0);
                assert_eq!(*height, 30.0);
                assert_eq!(text, "hello");
            }
            other => panic!("expected text body, got {other:?}"),
        }
    }

    #[test]
    fn test_text_box_preview_tracks_cursor() {
        let mut editor = editor_with_tool(Tool::Text);
        editor.pointer_down(Point::new(50.0, 50.0));
        let update = editor.pointer_move(Point::new(10.0, 80.0));
        assert_eq!(
            update,
            GestureUpdate::TextBoxPreview { bounds: Rect::new(10.0, 50.0, 40.0, 30.0) }
        );
    }

    #[test]
    fn test_empty_text_submission_discards_box() {
        let mut editor = editor_with_tool(Tool::Text);
        editor.pointer_down(Point::new(5.0, 5.0));
        editor.pointer_up();

        assert_eq!(editor.submit_text("   "), GestureUpdate::GestureEnded);
        assert!(editor.store().is_empty());
        assert_eq!(*editor.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_cancel_discards_text_box() {
        let mut editor = editor_with_tool(Tool::Text);
        editor.pointer_down(Point::new(5.0, 5.0));
        editor.pointer_up();

        assert_eq!(editor.cancel_text_input(), GestureUpdate::GestureEnded);
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_eraser_removes_first_hit_on_down() {
        let mut editor = editor_with_tool(Tool::Highlight);
        editor.settings_mut().stroke_width = 15.0;
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(100.0, 0.0));
        editor.pointer_up();

        editor.set_tool(Some(Tool::Eraser));
        let update = editor.pointer_down(Point::new(50.0, 5.0));
        assert!(matches!(update, GestureUpdate::Erased(_)));
        assert!(editor.store().is_empty());
        assert_eq!(editor.pointer_up(), GestureUpdate::GestureEnded);
    }

    #[test]
    fn test_drag_to_erase_removes_along_the_way() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(10.0, 0.0));
        editor.pointer_up();
        editor.pointer_down(Point::new(200.0, 200.0));
        editor.pointer_move(Point::new(210.0, 200.0));
        editor.pointer_up();
        assert_eq!(editor.store().len(), 2);

        editor.set_tool(Some(Tool::Eraser));
        editor.pointer_down(Point::new(500.0, 500.0)); // miss
        assert_eq!(editor.store().len(), 2);
        assert!(matches!(
            editor.pointer_move(Point::new(5.0, 0.0)),
            GestureUpdate::Erased(_)
        ));
        assert!(matches!(
            editor.pointer_move(Point::new(205.0, 200.0)),
            GestureUpdate::Erased(_)
        ));
        editor.pointer_up();
        assert!(editor.store().is_empty());
    }

    #[test]
    fn test_eraser_removes_one_annotation_per_hit_test() {
        let mut editor = editor_with_tool(Tool::Draw);
        // Two fully overlapping strokes
        for _ in 0..2 {
            editor.pointer_down(Point::new(0.0, 0.0));
            editor.pointer_move(Point::new(100.0, 0.0));
            editor.pointer_up();
        }

        editor.set_tool(Some(Tool::Eraser));
        editor.pointer_down(Point::new(50.0, 0.0));
        assert_eq!(editor.store().len(), 1);
    }

    #[test]
    fn test_tool_switch_ignored_mid_gesture() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.pointer_down(Point::new(0.0, 0.0));

        assert!(!editor.set_tool(Some(Tool::Eraser)));
        assert_eq!(editor.tool(), Some(Tool::Draw));
        assert!(!editor.set_page(2));

        editor.pointer_up();
        assert!(editor.set_tool(Some(Tool::Eraser)));
    }

    #[test]
    fn test_cancel_gesture_discards_in_progress_path() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(10.0, 10.0));

        assert_eq!(editor.cancel_gesture(), GestureUpdate::GestureEnded);
        assert!(editor.store().is_empty());
        assert_eq!(*editor.gesture(), Gesture::Idle);
        // Follow-up events are no-ops
        assert_eq!(editor.pointer_move(Point::new(20.0, 20.0)), GestureUpdate::Ignored);
        assert_eq!(editor.pointer_up(), GestureUpdate::Ignored);
    }

    #[test]
    fn test_no_tool_means_no_gesture() {
        let mut editor = AnnotationEditor::new(1);
        assert_eq!(editor.pointer_down(Point::new(0.0, 0.0)), GestureUpdate::Ignored);
        assert_eq!(*editor.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_annotations_land_on_current_page() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.set_page(3);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up();

        assert_eq!(editor.store().for_page(3).count(), 1);
        assert_eq!(editor.store().for_page(1).count(), 0);
    }

    #[test]
    fn test_reset_for_document_clears_everything() {
        let mut editor = editor_with_tool(Tool::Draw);
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_up();
        editor.pointer_down(Point::new(0.0, 0.0));

        editor.reset_for_document(1);
        assert!(editor.store().is_empty());
        assert_eq!(*editor.gesture(), Gesture::Idle);
    }
}
