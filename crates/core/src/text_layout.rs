//! Text measurement and word wrapping for text annotations
//!
//! There is no font rasterizer at this layer, so widths are estimated
//! from character count and font size. The ratio is a conservative
//! estimate for proportional fonts; the same estimate drives both the
//! on-screen layout and the exported underline lengths, so the two
//! stay consistent.

/// Average glyph advance relative to font size.
pub const CHAR_WIDTH_RATIO: f32 = 0.6;

/// Line height multiplier for wrapped text.
pub const LINE_HEIGHT: f32 = 1.2;

/// Horizontal/vertical inset between a text box edge and its content.
pub const TEXT_INSET: f32 = 5.0;

/// Estimate the rendered width of a string at a font size.
pub fn measure_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * CHAR_WIDTH_RATIO
}

/// Greedy word wrap against a maximum line width.
///
/// A word that does not fit moves to the next line; a single word
/// wider than the limit still occupies its own line (no mid-word
/// breaking). Whitespace runs collapse to single spaces.
pub fn wrap(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure_width(&candidate, font_size) > max_width && !current.is_empty() {
            lines.push(current);
            current = word.to_string();
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_width_scales_with_font_size() {
        assert_eq!(measure_width("abcd", 10.0), 24.0);
        assert_eq!(measure_width("abcd", 20.0), 48.0);
        assert_eq!(measure_width("", 16.0), 0.0);
    }

    #[test]
    fn test_short_text_stays_on_one_line() {
        let lines = wrap("hello world", 200.0, 16.0);
        assert_eq!(lines, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_wraps_at_word_boundaries() {
        // Each word is 5 chars = 48 units at 16pt; two words + space = 105.6
        let lines = wrap("alpha bravo charlie", 100.0, 16.0);
        assert_eq!(
            lines,
            vec!["alpha".to_string(), "bravo".to_string(), "charlie".to_string()]
        );
    }

    #[test]
    fn test_overlong_word_gets_its_own_line() {
        let lines = wrap("a extraordinarily b", 60.0, 16.0);
        assert_eq!(
            lines,
            vec!["a".to_string(), "extraordinarily".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_whitespace_collapses() {
        let lines = wrap("  hello   world  ", 500.0, 16.0);
        assert_eq!(lines, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_no_lines() {
        assert!(wrap("", 100.0, 16.0).is_empty());
        assert!(wrap("   ", 100.0, 16.0).is_empty());
    }
}
