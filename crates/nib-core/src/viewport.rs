//! The screen ↔ canvas coordinate mapping.
//!
//! Owns the current canvas→screen transform and its cached inverse. The
//! two are only ever replaced together, so neither can go stale on its
//! own. The viewport itself carries no other state than the transform and
//! the last-known screen rectangle; pan/zoom mutations funnel through
//! `Command` objects so they stay undoable.

use crate::mat::Mat33;
use crate::rect::Rect;
use crate::vec::Vec2;

#[derive(Debug, Clone)]
pub struct Viewport {
    /// Canvas → screen.
    transform: Mat33,
    /// Screen → canvas, recomputed atomically with `transform`.
    inverse: Mat33,
    screen_rect: Rect,
}

impl Viewport {
    pub fn new(screen_rect: Rect) -> Self {
        Self {
            transform: Mat33::IDENTITY,
            inverse: Mat33::IDENTITY,
            screen_rect,
        }
    }

    pub fn transform(&self) -> &Mat33 {
        &self.transform
    }

    pub fn screen_rect(&self) -> Rect {
        self.screen_rect
    }

    /// Render-surface resize notification from the host.
    pub fn set_screen_rect(&mut self, rect: Rect) {
        self.screen_rect = rect;
    }

    pub fn screen_to_canvas(&self, screen: Vec2) -> Vec2 {
        self.inverse.transform_point(screen)
    }

    pub fn canvas_to_screen(&self, canvas: Vec2) -> Vec2 {
        self.transform.transform_point(canvas)
    }

    /// Replace the transform, recomputing the cached inverse in the same
    /// step. A non-invertible transform is rejected (logged, state
    /// unchanged) — a viewport must always map both ways.
    pub fn update_transform(&mut self, transform: Mat33) -> bool {
        match transform.inverse_checked() {
            Some(inverse) => {
                self.transform = transform;
                self.inverse = inverse;
                true
            }
            None => {
                log::warn!("rejected non-invertible viewport transform");
                false
            }
        }
    }

    /// Magnitude of a transformed unit vector — the canvas→screen zoom
    /// factor, used to keep stroke widths and hit-test tolerances
    /// resolution-independent.
    pub fn scale_factor(&self) -> f64 {
        self.transform.transform_vec(Vec2::UNIT_X).magnitude()
    }

    /// The screen rectangle in canvas space.
    pub fn visible_rect(&self) -> Rect {
        self.screen_rect.transformed_bbox(&self.inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_transform() {
        let mut vp = Viewport::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        vp.update_transform(
            Mat33::translation(Vec2::new(50.0, 20.0)) * Mat33::scaling(2.0, Vec2::ZERO),
        );

        let canvas = Vec2::new(13.0, -4.0);
        let screen = vp.canvas_to_screen(canvas);
        assert!(vp.screen_to_canvas(screen).eq_approx(canvas, 1e-9));
        assert!((vp.scale_factor() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_singular_transform() {
        let mut vp = Viewport::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let before = *vp.transform();
        let degenerate = Mat33::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        assert!(!vp.update_transform(degenerate));
        assert_eq!(*vp.transform(), before);
    }

    #[test]
    fn visible_rect_tracks_zoom() {
        let mut vp = Viewport::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(vp.visible_rect().eq_approx(&Rect::new(0.0, 0.0, 100.0, 100.0), 1e-9));

        // Zooming in 2× halves the visible canvas area.
        vp.update_transform(Mat33::scaling(2.0, Vec2::ZERO));
        assert!(vp.visible_rect().eq_approx(&Rect::new(0.0, 0.0, 50.0, 50.0), 1e-9));
    }
}
