use glam::Vec2;

/// Client-space bounding box of the surface element, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left
            && p.y >= self.top
            && p.x <= self.left + self.width
            && p.y <= self.top + self.height
    }
}

/// Pointer position as 0..1 uv inside `rect` (y grows downward). `None` when
/// the point is outside the box or the box is degenerate; callers keep the
/// previous value in that case.
#[inline]
pub fn normalize_pointer(point: Vec2, rect: &Rect) -> Option<Vec2> {
    if !(rect.width > 0.0 && rect.height > 0.0) || !point.is_finite() {
        return None;
    }
    if !rect.contains(point) {
        return None;
    }
    let u = (point.x - rect.left) / rect.width;
    let v = (point.y - rect.top) / rect.height;
    Some(Vec2::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)))
}

/// Pointer uv converted to backing-store pixels.
#[inline]
pub fn uv_to_px(uv: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(uv.x * width as f32, uv.y * height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_point_maps_to_uv() {
        let r = Rect::new(100.0, 50.0, 200.0, 100.0);
        let uv = normalize_pointer(Vec2::new(150.0, 75.0), &r).unwrap();
        assert!((uv.x - 0.25).abs() < 1e-6);
        assert!((uv.y - 0.25).abs() < 1e-6);
    }

    #[test]
    fn edges_are_inside() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(normalize_pointer(Vec2::new(10.0, 10.0), &r), Some(Vec2::ONE));
        assert_eq!(normalize_pointer(Vec2::ZERO, &r), Some(Vec2::ZERO));
    }

    #[test]
    fn outside_or_degenerate_yields_none() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(normalize_pointer(Vec2::new(-1.0, 5.0), &r), None);
        assert_eq!(normalize_pointer(Vec2::new(5.0, 11.0), &r), None);
        let flat = Rect::new(0.0, 0.0, 0.0, 10.0);
        assert_eq!(normalize_pointer(Vec2::new(0.0, 5.0), &flat), None);
        assert_eq!(normalize_pointer(Vec2::new(f32::NAN, 5.0), &r), None);
    }
}
