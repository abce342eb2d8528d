use glam::{Mat4, vec3};

use crate::engine::ViewportListener;

/// Screen-space projection kept current through viewport notifications.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Projection {
    matrix: Mat4,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        Self { matrix: ortho_for(width, height) }
    }

    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

impl ViewportListener for Projection {
    fn update_viewport(&mut self, width: u32, height: u32) {
        self.matrix = ortho_for(width, height);
        log::trace!("font projection recomputed for {width}x{height}");
    }
}

/// `ortho(-w, w, -h, h, 0, 1) * translate(-w, -h, 0)`.
///
/// Maps `(0, 0)` to the bottom-left corner of clip space; the screen spans
/// `2w` by `2h` units.
pub(crate) fn ortho_for(width: u32, height: u32) -> Mat4 {
    let (w, h) = (width as f32, height as f32);
    Mat4::orthographic_rh_gl(-w, w, -h, h, 0.0, 1.0) * Mat4::from_translation(vec3(-w, -h, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_hand_computed_matrix() {
        let expected = Mat4::from_cols_array(&[
            1.0 / 600.0, 0.0, 0.0, 0.0,
            0.0, 1.0 / 800.0, 0.0, 0.0,
            0.0, 0.0, -2.0, 0.0,
            -1.0, -1.0, -1.0, 1.0,
        ]);
        assert!(ortho_for(600, 800).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn listener_update_replaces_matrix() {
        let mut projection = Projection::new(1, 1);
        projection.update_viewport(600, 800);
        assert_eq!(projection.matrix(), ortho_for(600, 800));
    }

    #[test]
    fn origin_lands_in_bottom_left_corner() {
        let p = ortho_for(640, 480).project_point3(vec3(0.0, 0.0, 0.0));
        assert!((p.x + 1.0).abs() < 1e-6 && (p.y + 1.0).abs() < 1e-6);
    }
}
