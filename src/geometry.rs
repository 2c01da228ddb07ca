//! Screen geometry: where pages sit in the container, and how a cursor
//! stop's box maps to a rectangle on screen.
//!
//! Stop boxes are in page-local score units; page geometry and cursor
//! rectangles are in container pixels.  `zoom` converts the former to the
//! latter.

use serde::{Deserialize, Serialize};

use crate::error::{CursorError, Result};
use crate::model::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Placement of one rendered page inside the scroll container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PageGeometry {
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.left && x < self.left + self.width
    }

    pub fn midline_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// The cursor rectangle requested from the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pages laid out left to right in index order, plus the current zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawViewGeometry")]
pub struct ViewGeometry {
    pages: Vec<PageGeometry>,
    zoom: f64,
}

/// Wire form of `ViewGeometry`, checked by `ViewGeometry::new` on the way in.
#[derive(Deserialize)]
struct RawViewGeometry {
    pages: Vec<PageGeometry>,
    zoom: f64,
}

impl TryFrom<RawViewGeometry> for ViewGeometry {
    type Error = CursorError;

    fn try_from(raw: RawViewGeometry) -> Result<Self> {
        Self::new(raw.pages, raw.zoom)
    }
}

impl Default for ViewGeometry {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            zoom: 1.0,
        }
    }
}

impl ViewGeometry {
    pub fn new(pages: Vec<PageGeometry>, zoom: f64) -> Result<Self> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(CursorError::InvalidGeometry(format!("zoom must be positive, got {zoom}")));
        }
        Ok(Self { pages, zoom })
    }

    /// `count` pages of identical size placed side by side, as a
    /// horizontally scrolling score viewer lays them out.
    pub fn side_by_side(count: usize, width: f64, height: f64, zoom: f64) -> Result<Self> {
        let pages = (0..count)
            .map(|i| PageGeometry {
                left: i as f64 * width,
                top: 0.0,
                width,
                height,
            })
            .collect();
        Self::new(pages, zoom)
    }

    pub fn pages(&self) -> &[PageGeometry] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&PageGeometry> {
        self.pages.get(index)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Index of the page whose horizontal span contains `x`.
    pub fn page_at_x(&self, x: f64) -> Option<usize> {
        self.pages.iter().position(|page| page.contains_x(x))
    }

    /// Convert a container point into page-local score units.
    pub fn to_page_local(&self, page_index: usize, point: Point) -> Option<Point> {
        let page = self.pages.get(page_index)?;
        Some(Point {
            x: (point.x - page.left) / self.zoom,
            y: (point.y - page.top) / self.zoom,
        })
    }

    /// Screen rectangle of a stop box on `page_index`, or `None` when the
    /// page is unknown or the box is not fully resolved.
    pub fn cursor_rect(&self, page_index: usize, bbox: &BoundingBox, y_offset: f64) -> Option<CursorRect> {
        let page = self.pages.get(page_index)?;
        if !bbox.is_resolved() {
            return None;
        }
        Some(CursorRect {
            x: page.left + bbox.start_x * self.zoom,
            y: page.top + bbox.start_y * self.zoom + y_offset,
            width: bbox.width * self.zoom,
            height: bbox.height() * self.zoom,
        })
    }
}

/// Squared distance from `point` to the rectangle spanned by `bbox`.
///
/// Zero inside the rectangle, otherwise the squared distance to the
/// nearest edge or corner.  Infinite for an unresolved box.
pub fn distance_squared(bbox: &BoundingBox, point: Point) -> f64 {
    if !bbox.is_resolved() {
        return f64::INFINITY;
    }
    let right = bbox.start_x + bbox.width;
    let dx = (bbox.start_x - point.x).max(point.x - right).max(0.0);
    let dy = (bbox.start_y - point.y).max(point.y - bbox.end_y).max(0.0);
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(start_x: f64, width: f64, start_y: f64, end_y: f64) -> BoundingBox {
        BoundingBox {
            start_x,
            width,
            start_y,
            end_y,
        }
    }

    #[test]
    fn distance_inside_is_zero() {
        let b = bbox(10.0, 20.0, 100.0, 140.0);
        assert_eq!(distance_squared(&b, Point::new(15.0, 120.0)), 0.0);
        assert_eq!(distance_squared(&b, Point::new(10.0, 100.0)), 0.0);
        assert_eq!(distance_squared(&b, Point::new(30.0, 140.0)), 0.0);
    }

    #[test]
    fn distance_to_edges_and_corners() {
        let b = bbox(10.0, 20.0, 100.0, 140.0);
        assert_eq!(distance_squared(&b, Point::new(5.0, 120.0)), 25.0);
        assert_eq!(distance_squared(&b, Point::new(20.0, 150.0)), 100.0);
        assert_eq!(distance_squared(&b, Point::new(33.0, 96.0)), 9.0 + 16.0);
    }

    #[test]
    fn unresolved_box_is_infinitely_far() {
        assert!(distance_squared(&BoundingBox::UNRESOLVED, Point::new(0.0, 0.0)).is_infinite());
    }

    #[test]
    fn pages_side_by_side() {
        let view = ViewGeometry::side_by_side(3, 800.0, 1000.0, 2.0).unwrap();
        assert_eq!(view.page_at_x(0.0), Some(0));
        assert_eq!(view.page_at_x(799.9), Some(0));
        assert_eq!(view.page_at_x(800.0), Some(1));
        assert_eq!(view.page_at_x(2399.0), Some(2));
        assert_eq!(view.page_at_x(2400.0), None);
        assert_eq!(view.page_at_x(-1.0), None);
        assert_eq!(view.to_page_local(1, Point::new(900.0, 50.0)), Some(Point::new(50.0, 25.0)));
    }

    #[test]
    fn cursor_rect_scales_by_zoom() {
        let view = ViewGeometry::new(
            vec![PageGeometry {
                left: 800.0,
                top: 30.0,
                width: 800.0,
                height: 1000.0,
            }],
            1.5,
        )
        .unwrap();
        let rect = view.cursor_rect(0, &bbox(100.0, 10.0, 40.0, 80.0), -5.0).unwrap();
        assert_eq!(rect, CursorRect { x: 950.0, y: 85.0, width: 15.0, height: 60.0 });
        assert!(view.cursor_rect(1, &bbox(0.0, 1.0, 0.0, 1.0), 0.0).is_none());
        assert!(view.cursor_rect(0, &BoundingBox::UNRESOLVED, 0.0).is_none());
    }

    #[test]
    fn rejects_bad_zoom() {
        assert!(ViewGeometry::new(vec![], 0.0).is_err());
        assert!(ViewGeometry::new(vec![], f64::NAN).is_err());
    }

    #[test]
    fn deserialized_view_is_validated() {
        let ok: ViewGeometry = serde_json::from_str(
            r#"{"pages": [{"left": 0.0, "top": 0.0, "width": 800.0, "height": 1000.0}], "zoom": 2.0}"#,
        )
        .unwrap();
        assert_eq!(ok.page_count(), 1);
        assert_eq!(ok.zoom(), 2.0);

        let zero = serde_json::from_str::<ViewGeometry>(r#"{"pages": [], "zoom": 0.0}"#);
        assert!(zero.is_err());
    }
}
