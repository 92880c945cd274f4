use glam::{Mat4, Vec3};

/// Orbit camera circling the field centre.
///
/// The field lies on the XZ plane; the camera looks down at it from
/// `elevation` above the horizon, `distance` away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldCamera {
    pub target: Vec3,
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub sensitivity: f32,
}

impl Default for FieldCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            azimuth: 90.0_f32.to_radians(),
            elevation: 55.0_f32.to_radians(),
            distance: 22.0,
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 500.0,
            sensitivity: 0.005,
        }
    }
}

impl FieldCamera {
    /// Frame a field of the given half depth.
    pub fn framing(half_depth: f32, aspect: f32) -> Self {
        Self {
            distance: half_depth * 2.2,
            aspect,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        let horizontal = self.distance * self.elevation.cos();
        self.target
            + Vec3::new(
                horizontal * self.azimuth.cos(),
                self.distance * self.elevation.sin(),
                horizontal * self.azimuth.sin(),
            )
    }

    /// Drag to orbit; the elevation stays above the field plane.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth += dx * self.sensitivity;
        self.elevation = (self.elevation + dy * self.sensitivity)
            .clamp(5.0_f32.to_radians(), 89.0_f32.to_radians());
    }

    /// Scroll to zoom; positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance = (self.distance * 0.9_f32.powf(steps)).clamp(2.0, self.far * 0.5);
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_is_above_field() {
        let cam = FieldCamera::default();
        assert!(cam.position().y > 0.0);
        assert!(cam.view_projection().is_finite());
    }

    #[test]
    fn centre_projects_to_screen_centre() {
        let cam = FieldCamera::framing(10.0, 1.5);
        let clip = cam.view_projection() * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn orbit_keeps_distance_and_clamps_elevation() {
        let mut cam = FieldCamera::default();
        cam.orbit(300.0, 10_000.0);
        assert!((cam.position().distance(cam.target) - cam.distance).abs() < 1e-3);
        assert!(cam.elevation <= 89.0_f32.to_radians());
        cam.orbit(0.0, -10_000.0);
        assert!(cam.elevation >= 5.0_f32.to_radians());
    }

    #[test]
    fn zoom_and_aspect_bounds() {
        let mut cam = FieldCamera::default();
        cam.zoom(1000.0);
        assert_eq!(cam.distance, 2.0);
        let before = cam.aspect;
        cam.set_aspect(0.0, 100.0);
        assert_eq!(cam.aspect, before);
    }
}
