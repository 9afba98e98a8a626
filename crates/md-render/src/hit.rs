//! Hit testing: point → element lookup and region selection.
//!
//! Pure functions over a [`Scene`]. A point hits an element when it lies
//! inside the element's axis-aligned box (unsized elements use the
//! 100×30 fallback). Region modes test only the element *center*, so a
//! box straddling the region edge is selected only if its center is in.
//!
//! Every region function returns indices in ascending order.

use kurbo::Affine;
use md_core::{Bounds, Point, Scene};

/// Find the topmost element at `(px, py)`.
/// Returns `None` for empty canvas.
pub fn hit_test(scene: &Scene, px: f32, py: f32) -> Option<usize> {
    scene
        .elements
        .iter()
        .enumerate()
        .rev()
        .find(|(_, el)| el.bounds().contains(px, py))
        .map(|(i, _)| i)
}

/// Elements whose centers lie inside the box spanned by two drag points.
pub fn select_in_rect(scene: &Scene, start: Point, end: Point) -> Vec<usize> {
    let region = Bounds::from_corners(start, end);
    select_where(scene, |c| region.contains(c.x, c.y))
}

/// Elements whose centers lie within the circle whose diameter is the
/// segment between the two drag points.
pub fn select_in_circle(scene: &Scene, start: Point, end: Point) -> Vec<usize> {
    let center = start.midpoint(end);
    let radius = start.distance(end) / 2.0;
    select_where(scene, |c| c.distance(center) <= radius)
}

/// Elements whose centers fall inside the lasso traced by `path`, closed
/// implicitly. Fewer than three points select nothing.
pub fn select_in_freeform(scene: &Scene, path: &[Point]) -> Vec<usize> {
    if path.len() < 3 {
        return Vec::new();
    }
    select_where(scene, |c| point_in_polygon(c, path))
}

fn select_where(scene: &Scene, inside: impl Fn(Point) -> bool) -> Vec<usize> {
    scene
        .elements
        .iter()
        .enumerate()
        .filter(|(_, el)| inside(el.center()))
        .map(|(i, _)| i)
        .collect()
}

/// Even-odd ray casting. The polygon is closed from its last vertex back
/// to the first.
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

// ─── Mockup layers ───────────────────────────────────────────────────────

/// Where a mockup layer sits on the canvas: a `width × height` box
/// centered on `center`, then rotated and scaled about that center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBox {
    pub center: Point,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub scale: f32,
}

impl LayerBox {
    /// Maps the box's local space (origin at its center) to canvas pixels.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.center.x as f64, self.center.y as f64))
            * Affine::rotate((self.rotation as f64).to_radians())
            * Affine::scale(self.scale as f64)
    }

    /// Canvas-space corners, clockwise from the top-left.
    pub fn corners(&self) -> [Point; 4] {
        let (hw, hh) = (self.width as f64 / 2.0, self.height as f64 / 2.0);
        let t = self.transform();
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(x, y)| {
            let p = t * kurbo::Point::new(x, y);
            Point::new(p.x as f32, p.y as f32)
        })
    }
}

/// Whether `(px, py)` falls inside the layer's transformed box.
pub fn layer_hit_test(layer: &LayerBox, px: f32, py: f32) -> bool {
    if layer.scale.abs() < f32::EPSILON {
        return false;
    }
    let local = layer.transform().inverse() * kurbo::Point::new(px as f64, py as f64);
    local.x.abs() <= layer.width as f64 / 2.0 && local.y.abs() <= layer.height as f64 / 2.0
}
