use eframe::egui::{Rect, Vec2};

/// Uniform scale factor that fits `src` inside `bounds` while preserving
/// aspect ratio. May upscale; degenerate inputs yield 0.
#[inline]
pub fn fit_scale(src: Vec2, bounds: Vec2) -> f32 {
    if src.x <= 0.0 || src.y <= 0.0 || bounds.x <= 0.0 || bounds.y <= 0.0 {
        return 0.0;
    }
    (bounds.x / src.x).min(bounds.y / src.y)
}

/// Target rect for drawing a `src`-sized frame letterboxed inside `bounds`:
/// scaled uniformly and centered. The caller paints `bounds` black; the
/// canvas is always exactly the window box.
#[inline]
pub fn letterbox(bounds: Rect, src: Vec2) -> Rect {
    Rect::from_center_size(bounds.center(), src * fit_scale(src, bounds.size()))
}
