//! Layer outline types.

use nalgebra::Point2;

/// A 2D polygon (closed path) in display millimetres.
///
/// Outer contours are CCW, holes are CW. Rasterization uses non-zero
/// winding, so a hole must wind opposite to the contour it cuts.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point2<f64>>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2<f64>>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle, CCW.
    pub fn rectangle(min: Point2<f64>, max: Point2<f64>) -> Self {
        Self::new(vec![
            min,
            Point2::new(max.x, min.y),
            max,
            Point2::new(min.x, max.y),
        ])
    }

    /// Check if the polygon is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Signed area of the polygon.
    /// Positive for counter-clockwise, negative for clockwise.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += self.points[i].x * self.points[j].y;
            area -= self.points[j].x * self.points[i].y;
        }
        area / 2.0
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Ensure clockwise winding, as holes are drawn.
    pub fn ensure_cw(&mut self) {
        if self.is_ccw() {
            self.points.reverse();
        }
    }

    /// Bounding box as (min, max), or `None` for an empty polygon.
    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = self.points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Iterate over the closing edges `(p[i], p[i + 1])`, wrapping around.
    pub fn edges(&self) -> impl Iterator<Item = (Point2<f64>, Point2<f64>)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_area() {
        let square = Polygon::rectangle(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        assert!((square.signed_area() - 1.0).abs() < 1e-10);
        assert!(square.is_ccw());
    }

    #[test]
    fn test_winding() {
        let mut hole = Polygon::rectangle(Point2::new(2.0, 2.0), Point2::new(4.0, 4.0));
        hole.ensure_cw();
        assert!(!hole.is_ccw());
        assert!((hole.signed_area() + 4.0).abs() < 1e-10);
        hole.ensure_cw();
        assert!(!hole.is_ccw());
    }

    #[test]
    fn test_bounds_and_edges() {
        let tri = Polygon::new(vec![
            Point2::new(1.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(-1.0, 5.0),
        ]);
        let (min, max) = tri.bounds().unwrap();
        assert_eq!((min.x, min.y), (-1.0, 0.0));
        assert_eq!((max.x, max.y), (3.0, 5.0));
        assert_eq!(tri.edges().count(), 3);
        assert!(Polygon::new(Vec::new()).bounds().is_none());
    }
}
