//! Tool selection and session-scoped tool settings

use crate::annotation::{Color, TextStyle};

/// Annotation tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Draw,
    Highlight,
    Text,
    Eraser,
}

/// Session-scoped tool configuration
///
/// Mutated by UI controls and read by the input state machine when
/// instantiating new annotations. Not a stored entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    /// Stroke color for draw/highlight
    pub color: Color,

    /// Stroke width in document-space units
    pub stroke_width: f32,

    /// Fill color for text annotations
    pub text_color: Color,

    /// Text formatting defaults
    pub text: TextStyle,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::RED,
            stroke_width: 3.0,
            text_color: Color::BLACK,
            text: TextStyle::default(),
        }
    }
}

impl ToolSettings {
    /// Adjust stroke defaults when the user switches tools.
    ///
    /// Switching to highlight forces a yellow tint and a wide stroke;
    /// switching back to draw restores the pen defaults unless the user
    /// had already picked custom values.
    pub fn select_tool_defaults(&mut self, tool: Tool) {
        let is_highlight_tint = self.color.r == 255 && self.color.g == 255;
        match tool {
            Tool::Highlight => {
                if !is_highlight_tint {
                    self.color = Color::YELLOW;
                }
                if self.stroke_width < 10.0 {
                    self.stroke_width = 15.0;
                }
            }
            Tool::Draw => {
                if is_highlight_tint {
                    self.color = Color::RED;
                }
                if self.stroke_width >= 10.0 {
                    self.stroke_width = 3.0;
                }
            }
            Tool::Text | Tool::Eraser => {}
        }
    }
}
