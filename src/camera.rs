//! Views that map world positions to screen pixels and back.
//!
//! Planar fields work directly in pixels. Volumetric fields use an orbit
//! [`Camera`]; the pointer is resolved into world space by casting a ray and
//! intersecting it with the plane through the particle that faces the camera.

use glam::{Mat4, Vec2, Vec3};

use crate::config::ViewMode;

/// Orbit camera for viewing 3D fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Yaw added by [`Camera::advance`], in radians per frame.
    pub auto_rotate: f32,
}

impl Camera {
    /// Create a new camera with default positioning.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 3.0,
            target: Vec3::ZERO,
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            auto_rotate: 0.0,
        }
    }

    /// Camera on the +Z axis looking at the origin from `distance`.
    ///
    /// Clip planes scale with the distance so that a volume about the size
    /// of the distance stays visible.
    pub fn orbit(distance: f32, fov_y_deg: f32) -> Self {
        Self {
            pitch: 0.0,
            distance,
            fov_y: fov_y_deg.to_radians(),
            near: (distance * 0.002).max(1e-3),
            far: distance * 4.0,
            ..Self::new()
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn view_proj(&self, viewport: Vec2) -> Mat4 {
        let aspect = if viewport.y > 0.0 {
            viewport.x / viewport.y
        } else {
            1.0
        };
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far) * self.view_matrix()
    }

    /// Rotate by the auto-rotation step.
    pub fn advance(&mut self) {
        self.yaw += self.auto_rotate;
    }

    /// Project a world position to screen pixels (origin top-left, y down).
    ///
    /// Returns `None` for points behind the camera or a zero-area viewport.
    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let clip = self.view_proj(viewport) * world.extend(1.0);
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * viewport.x,
            (1.0 - ndc.y) * 0.5 * viewport.y,
        ))
    }

    /// Ray from the camera through a screen position.
    pub fn ray(&self, screen: Vec2, viewport: Vec2) -> Option<Ray> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            screen.x / viewport.x * 2.0 - 1.0,
            1.0 - screen.y / viewport.y * 2.0,
        );
        let inverse = self.view_proj(viewport).inverse();
        let far_point = inverse.project_point3(ndc.extend(1.0));
        let origin = self.position();
        let direction = (far_point - origin).normalize_or_zero();
        if direction == Vec3::ZERO || !direction.is_finite() {
            return None;
        }
        Some(Ray { origin, direction })
    }

    /// Where the pointer ray meets the camera-facing plane through `through`.
    pub fn pointer_on_plane(&self, screen: Vec2, viewport: Vec2, through: Vec3) -> Option<Vec3> {
        let ray = self.ray(screen, viewport)?;
        let normal = self.forward();
        let eye = self.position();
        let plane_point = eye + normal * (through - eye).dot(normal);

        let denom = normal.dot(ray.direction);
        if denom.abs() < 1e-5 {
            return None;
        }
        let t = (plane_point - ray.origin).dot(normal) / denom;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some(ray.at(t))
    }

    /// Pointer world position on the plane through `through`, and the world
    /// length of one screen pixel at that depth.
    pub fn pointer_world(&self, screen: Vec2, viewport: Vec2, through: Vec3) -> Option<(Vec3, f32)> {
        let at = self.pointer_on_plane(screen, viewport, through)?;

        let mut px_to_world = 1.0;
        if let Some(dx) = self.pointer_on_plane(screen + Vec2::X, viewport, through) {
            let d = dx.distance(at);
            if d > 0.0 {
                px_to_world = d;
            }
        }
        if let Some(dy) = self.pointer_on_plane(screen + Vec2::Y, viewport, through) {
            let d = dy.distance(at);
            let d = if d > 0.0 { d } else { px_to_world };
            px_to_world = (px_to_world + d) * 0.5;
        }

        Some((at, px_to_world))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance from `point` to the closest point on the ray.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        let t = (point - self.origin).dot(self.direction).max(0.0);
        self.at(t).distance(point)
    }
}

/// How a field maps between world and screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    /// World x/y are screen pixels; z is ignored when drawing.
    Planar,
    Perspective(Camera),
}

impl View {
    pub fn from_mode(mode: &ViewMode) -> Self {
        match *mode {
            ViewMode::Planar => View::Planar,
            ViewMode::Perspective {
                fov_y_deg,
                distance,
                auto_rotate,
            } => View::Perspective(Camera {
                auto_rotate,
                ..Camera::orbit(distance, fov_y_deg)
            }),
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match self {
            View::Planar => None,
            View::Perspective(camera) => Some(camera),
        }
    }

    #[inline]
    pub fn is_planar(&self) -> bool {
        matches!(self, View::Planar)
    }

    /// Advance per-frame camera motion.
    pub fn advance(&mut self) {
        if let View::Perspective(camera) = self {
            camera.advance();
        }
    }

    pub fn project(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        match self {
            View::Planar => Some(world.truncate()),
            View::Perspective(camera) => camera.project(world, viewport),
        }
    }

    /// Resolve the pointer into world space at the depth of `through`.
    pub fn pointer_world(&self, screen: Vec2, viewport: Vec2, through: Vec3) -> Option<(Vec3, f32)> {
        match self {
            View::Planar => Some((screen.extend(through.z), 1.0)),
            View::Perspective(camera) => camera.pointer_world(screen, viewport, through),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera() -> Camera {
        Camera {
            fov_y: 90.0_f32.to_radians(),
            ..Camera::orbit(10.0, 90.0)
        }
    }

    #[test]
    fn test_camera_position_on_z_axis() {
        let camera = front_camera();
        assert!((camera.position() - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-4);
        assert!((camera.forward() - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn test_project_target_to_center() {
        let camera = front_camera();
        let viewport = Vec2::new(200.0, 200.0);
        let screen = camera.project(Vec3::ZERO, viewport).unwrap();
        assert!((screen - Vec2::new(100.0, 100.0)).length() < 1e-3);
    }

    #[test]
    fn test_project_up_is_screen_up() {
        let camera = front_camera();
        let viewport = Vec2::new(200.0, 200.0);
        let screen = camera.project(Vec3::new(0.0, 5.0, 0.0), viewport).unwrap();
        // Half the visible height at distance 10 with 90° fov is 10 units
        assert!((screen.y - 50.0).abs() < 1e-2);
    }

    #[test]
    fn test_project_behind_camera_is_none() {
        let camera = front_camera();
        assert!(camera.project(Vec3::new(0.0, 0.0, 20.0), Vec2::splat(200.0)).is_none());
    }

    #[test]
    fn test_pointer_world_at_center() {
        let camera = front_camera();
        let viewport = Vec2::new(200.0, 200.0);
        let (world, px) = camera
            .pointer_world(Vec2::new(100.0, 100.0), viewport, Vec3::ZERO)
            .unwrap();
        assert!(world.length() < 1e-3);
        // 200px spans 20 world units at this depth
        assert!((px - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_pointer_world_follows_plane_depth() {
        let camera = front_camera();
        let viewport = Vec2::new(200.0, 200.0);
        let (world, _) = camera
            .pointer_world(Vec2::new(150.0, 100.0), viewport, Vec3::new(3.0, 1.0, 5.0))
            .unwrap();
        assert!((world.z - 5.0).abs() < 1e-3);
        // Closer plane: half width is 5 units, so 50px right of center is 2.5
        assert!((world.x - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_ray_distance_to_point() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::X,
        };
        assert!((ray.distance_to_point(Vec3::new(5.0, 3.0, 0.0)) - 3.0).abs() < 1e-5);
        assert!((ray.distance_to_point(Vec3::new(-4.0, 0.0, 0.0)) - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_planar_view_is_identity() {
        let view = View::Planar;
        let p = Vec3::new(12.0, 34.0, 7.0);
        assert_eq!(view.project(p, Vec2::ZERO), Some(Vec2::new(12.0, 34.0)));
        let (world, px) = view.pointer_world(Vec2::new(5.0, 6.0), Vec2::ZERO, p).unwrap();
        assert_eq!(world, Vec3::new(5.0, 6.0, 7.0));
        assert_eq!(px, 1.0);
    }

    #[test]
    fn test_auto_rotate_advances_yaw() {
        let mut view = View::from_mode(&ViewMode::Perspective {
            fov_y_deg: 70.0,
            distance: 600.0,
            auto_rotate: 0.01,
        });
        view.advance();
        view.advance();
        assert!((view.camera().unwrap().yaw - 0.02).abs() < 1e-6);
    }
}
