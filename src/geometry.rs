// ============================================================================
// GEOMETRY - display scale and the screen <-> image coordinate mapping
// ============================================================================

/// Integer pixel position in original-image space. May lie outside the image
/// when the pointer strays past an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImagePoint {
    pub x: i32,
    pub y: i32,
}

impl ImagePoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Position relative to the top-left corner of the on-screen preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: ScreenPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Ratio between the preview and the original image. Always in (0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayScale(f64);

impl Default for DisplayScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DisplayScale {
    /// Largest scale at which the image fits in `max_w` x `max_h`, never
    /// enlarging. Degenerate sizes fall back to 1.
    pub fn fit(orig_w: u32, orig_h: u32, max_w: u32, max_h: u32) -> Self {
        if orig_w == 0 || orig_h == 0 || max_w == 0 || max_h == 0 {
            return Self(1.0);
        }
        let sx = (max_w as f64 / orig_w as f64).min(1.0);
        let sy = (max_h as f64 / orig_h as f64).min(1.0);
        Self(sx.min(sy))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_downscaled(&self) -> bool {
        self.0 < 1.0
    }

    /// Preview dimensions for an original of `w` x `h`.
    pub fn display_size(&self, w: u32, h: u32) -> (u32, u32) {
        if !self.is_downscaled() {
            return (w, h);
        }
        let dw = ((w as f64 * self.0).round() as u32).max(1);
        let dh = ((h as f64 * self.0).round() as u32).max(1);
        (dw, dh)
    }

    /// Pointer position on the preview -> pixel in the original image.
    pub fn to_image(&self, p: ScreenPoint) -> ImagePoint {
        ImagePoint::new(
            (p.x as f64 / self.0).round() as i32,
            (p.y as f64 / self.0).round() as i32,
        )
    }

    /// Original-image pixel -> position on the preview.
    pub fn to_screen(&self, p: ImagePoint) -> ScreenPoint {
        ScreenPoint::new((p.x as f64 * self.0) as f32, (p.y as f64 * self.0) as f32)
    }

    /// Original-image length -> preview length.
    pub fn to_screen_len(&self, len: u32) -> f32 {
        (len as f64 * self.0) as f32
    }
}

/// Line joining two brush circles of radius `pull_back`, trimmed so neither
/// end enters a circle. `None` while the circles touch or overlap.
pub fn connector(
    from: ScreenPoint,
    to: ScreenPoint,
    pull_back: f32,
) -> Option<(ScreenPoint, ScreenPoint)> {
    let dist = from.distance(to);
    if dist <= 2.0 * pull_back || dist <= f32::EPSILON {
        return None;
    }
    let ux = (to.x - from.x) / dist;
    let uy = (to.y - from.y) / dist;
    Some((
        ScreenPoint::new(from.x + ux * pull_back, from.y + uy * pull_back),
        ScreenPoint::new(to.x - ux * pull_back, to.y - uy * pull_back),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_picks_tighter_axis() {
        let s = DisplayScale::fit(2000, 1500, 1200, 900);
        assert!((s.value() - 0.6).abs() < 1e-12);
        assert_eq!(s.display_size(2000, 1500), (1200, 900));

        let s = DisplayScale::fit(3000, 1000, 1200, 900);
        assert!((s.value() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn display_size_rounds_rather_than_truncates() {
        // 1500 * (1200 / 2001) = 899.55
        let s = DisplayScale::fit(2001, 1500, 1200, 900);
        assert_eq!(s.display_size(2001, 1500), (1200, 900));
    }

    #[test]
    fn fit_never_enlarges() {
        let s = DisplayScale::fit(640, 480, 1200, 900);
        assert_eq!(s.value(), 1.0);
        assert!(!s.is_downscaled());
        assert_eq!(s.display_size(640, 480), (640, 480));
    }

    #[test]
    fn fit_handles_degenerate_sizes() {
        assert_eq!(DisplayScale::fit(0, 10, 1200, 900).value(), 1.0);
        assert_eq!(DisplayScale::fit(10, 10, 0, 900).value(), 1.0);
    }

    #[test]
    fn display_size_is_at_least_one_pixel() {
        let s = DisplayScale::fit(10_000, 1, 100, 100);
        assert_eq!(s.display_size(10_000, 1), (100, 1));
    }

    #[test]
    fn to_image_rounds_to_nearest_pixel() {
        let s = DisplayScale::fit(2000, 1500, 1200, 900);
        assert_eq!(s.to_image(ScreenPoint::new(100.0, 100.0)), ImagePoint::new(167, 167));
        assert_eq!(s.to_image(ScreenPoint::new(400.0, 100.0)), ImagePoint::new(667, 167));
    }

    #[test]
    fn round_trip_stays_within_one_pixel() {
        for &(w, h) in &[(2000u32, 1500u32), (4032, 3024), (1201, 901), (5000, 700), (900, 900)] {
            let s = DisplayScale::fit(w, h, 1200, 900);
            let (dw, dh) = s.display_size(w, h);
            for sy in (0..dh).step_by(37) {
                for sx in (0..dw).step_by(41) {
                    let p = ScreenPoint::new(sx as f32, sy as f32);
                    let back = s.to_screen(s.to_image(p));
                    assert!((back.x - p.x).abs() <= 1.0, "x {} -> {}", p.x, back.x);
                    assert!((back.y - p.y).abs() <= 1.0, "y {} -> {}", p.y, back.y);
                }
            }
        }
    }

    #[test]
    fn connector_is_trimmed_by_radius_on_both_ends() {
        let (a, b) = connector(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(100.0, 0.0), 10.0)
            .expect("circles are apart");
        assert!((a.x - 10.0).abs() < 1e-4 && a.y.abs() < 1e-4);
        assert!((b.x - 90.0).abs() < 1e-4 && b.y.abs() < 1e-4);

        let (a, b) = connector(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(30.0, 40.0), 5.0)
            .expect("circles are apart");
        assert!((a.x - 3.0).abs() < 1e-4 && (a.y - 4.0).abs() < 1e-4);
        assert!((b.x - 27.0).abs() < 1e-4 && (b.y - 36.0).abs() < 1e-4);
    }

    #[test]
    fn connector_absent_when_circles_meet() {
        let a = ScreenPoint::new(0.0, 0.0);
        assert!(connector(a, ScreenPoint::new(20.0, 0.0), 10.0).is_none());
        assert!(connector(a, ScreenPoint::new(5.0, 5.0), 10.0).is_none());
        assert!(connector(a, a, 0.0).is_none());
    }
}
