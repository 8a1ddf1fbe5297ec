//! Geometry primitives for annotation hit-testing
//!
//! Coordinates are in document space: unscaled page units with the
//! origin at the top-left corner, y increasing downward.

/// A point in document space.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Divide both components by a scale factor (screen -> document space).
    pub fn unscaled(&self, scale: f32) -> Point {
        Point::new(self.x / scale, self.y / scale)
    }

    /// Multiply both components by a scale factor (document -> screen space).
    pub fn scaled(&self, scale: f32) -> Point {
        Point::new(self.x * scale, self.y * scale)
    }
}

/// Axis-aligned rectangle in document space, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanning two arbitrary corners, with minimum size floors.
    ///
    /// The min corner becomes the origin; width and height are clamped
    /// up to the given floors so a near-zero drag still yields a usable
    /// box.
    pub fn from_drag(a: Point, b: Point, min_width: f32, min_height: f32) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs().max(min_width),
            height: (a.y - b.y).abs().max(min_height),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Distance from a point to a line segment.
///
/// Projects the point onto the infinite line through the segment,
/// clamps the projection parameter to [0, 1], and measures the
/// Euclidean distance to the clamped position.
pub fn distance_to_segment(point: Point, start: Point, end: Point) -> f32 {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        // Degenerate segment
        return point.distance_to(&start);
    }

    let t = ((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let closest = Point::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_distance_to_segment_perpendicular() {
        let dist = distance_to_segment(
            Point::new(50.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((dist - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoint() {
        // Point beyond the end of the segment measures to the endpoint
        let dist = distance_to_segment(
            Point::new(110.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert!((dist - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_distance_to_segment_endpoint_is_zero() {
        let dist = distance_to_segment(
            Point::new(100.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
        );
        assert_eq!(dist, 0.0);
    }

    #[test]
    fn test_distance_to_degenerate_segment() {
        let dist = distance_to_segment(
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!((dist - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_rect_containment_is_inclusive() {
        let rect = Rect::new(10.0, 10.0, 100.0, 30.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(110.0, 40.0)));
        assert!(rect.contains(Point::new(50.0, 25.0)));
        assert!(!rect.contains(Point::new(110.1, 25.0)));
        assert!(!rect.contains(Point::new(50.0, 9.9)));
    }

    #[test]
    fn test_rect_from_drag_clamps_to_floors() {
        let rect = Rect::from_drag(Point::new(5.0, 5.0), Point::new(5.0, 5.0), 100.0, 30.0);
        assert_eq!(rect.x, 5.0);
        assert_eq!(rect.y, 5.0);
        assert_eq!(rect.width, 100.0);
        assert_eq!(rect.height, 30.0);
    }

    #[test]
    fn test_rect_from_drag_normalizes_corners() {
        let rect = Rect::from_drag(Point::new(200.0, 150.0), Point::new(50.0, 40.0), 100.0, 30.0);
        assert_eq!(rect.x, 50.0);
        assert_eq!(rect.y, 40.0);
        assert_eq!(rect.width, 150.0);
        assert_eq!(rect.height, 110.0);
    }

    #[test]
    fn test_point_scaling_round_trip() {
        let p = Point::new(10.0, 20.0);
        let scaled = p.scaled(1.5);
        assert_eq!(scaled, Point::new(15.0, 30.0));
        assert_eq!(scaled.unscaled(1.5), p);
    }
}
