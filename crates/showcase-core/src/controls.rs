//! Orbit camera controls
//!
//! The camera sits on a sphere around a focus point (Y up). Input moves a
//! goal orbit; [`OrbitController::advance`] eases the current orbit toward
//! the goal. Pan, zoom and rotate are each gated by [`ControlsConfig`].

pub use glam::{Vec2, Vec3};

use crate::config::ControlsConfig;

/// Keeps the view direction away from the poles so `right` stays defined
const MAX_ELEVATION: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Spherical camera placement around a focus point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    pub focus: Vec3,
    pub distance: f32,
    /// Angle around Y, 0 looks down -Z
    pub azimuth: f32,
    /// Angle above the horizontal plane
    pub elevation: f32,
}

impl Orbit {
    /// Orbit that places the eye at `eye` looking at `focus`
    pub fn from_eye(eye: Vec3, focus: Vec3) -> Self {
        let offset = eye - focus;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return Self {
                focus,
                distance: 0.0,
                azimuth: 0.0,
                elevation: 0.0,
            };
        }
        Self {
            focus,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance)
                .clamp(-1.0, 1.0)
                .asin()
                .clamp(-MAX_ELEVATION, MAX_ELEVATION),
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.focus + self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    /// Screen-right and screen-up directions in world space
    fn screen_axes(&self) -> (Vec3, Vec3) {
        let forward = (self.focus - self.eye()).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }

    fn lerp(&self, goal: &Orbit, t: f32) -> Orbit {
        Orbit {
            focus: self.focus.lerp(goal.focus, t),
            distance: self.distance + (goal.distance - self.distance) * t,
            azimuth: self.azimuth + (goal.azimuth - self.azimuth) * t,
            elevation: self.elevation + (goal.elevation - self.elevation) * t,
        }
    }
}

/// Pointer/touch input accumulated over one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitInput {
    /// Drag delta in pixels for rotation
    pub rotate: Vec2,
    /// Drag delta in pixels for panning
    pub pan: Vec2,
    /// Scroll lines, positive zooms in
    pub zoom: f32,
    /// Pinch distance ratio (previous / current), 1.0 when not pinching
    pub pinch: f32,
}

impl Default for OrbitInput {
    fn default() -> Self {
        Self {
            rotate: Vec2::ZERO,
            pan: Vec2::ZERO,
            zoom: 0.0,
            pinch: 1.0,
        }
    }
}

impl OrbitInput {
    pub fn is_idle(&self) -> bool {
        self.rotate == Vec2::ZERO
            && self.pan == Vec2::ZERO
            && self.zoom == 0.0
            && self.pinch == 1.0
    }
}

#[derive(Debug, Clone)]
pub struct OrbitController {
    config: ControlsConfig,
    goal: Orbit,
    current: Orbit,
}

impl OrbitController {
    pub fn new(config: ControlsConfig, eye: Vec3, focus: Vec3) -> Self {
        let orbit = Orbit::from_eye(eye, focus);
        Self {
            config,
            goal: orbit,
            current: orbit,
        }
    }

    pub fn config(&self) -> &ControlsConfig {
        &self.config
    }

    pub fn current(&self) -> &Orbit {
        &self.current
    }

    pub fn goal(&self) -> &Orbit {
        &self.goal
    }

    pub fn eye(&self) -> Vec3 {
        self.current.eye()
    }

    pub fn focus(&self) -> Vec3 {
        self.current.focus
    }

    /// Apply one frame of input to the goal orbit. Returns whether any
    /// enabled capability consumed input.
    pub fn apply(&mut self, input: &OrbitInput) -> bool {
        let mut changed = false;
        let cfg = &self.config;

        if cfg.enable_rotate && input.rotate != Vec2::ZERO {
            self.goal.azimuth -= input.rotate.x * cfg.rotate_speed;
            self.goal.elevation = (self.goal.elevation + input.rotate.y * cfg.rotate_speed)
                .clamp(-MAX_ELEVATION, MAX_ELEVATION);
            changed = true;
        }

        if cfg.enable_pan && input.pan != Vec2::ZERO {
            let (right, up) = self.goal.screen_axes();
            let speed = self.goal.distance * cfg.pan_speed;
            self.goal.focus -= right * input.pan.x * speed;
            self.goal.focus += up * input.pan.y * speed;
            changed = true;
        }

        if cfg.enable_zoom {
            let mut factor = 1.0;
            if input.zoom != 0.0 {
                factor *= (1.0 - input.zoom * cfg.zoom_speed).max(0.1);
            }
            if input.pinch != 1.0 && input.pinch > 0.0 {
                factor *= input.pinch;
            }
            if factor != 1.0 {
                self.goal.distance =
                    (self.goal.distance * factor).clamp(cfg.min_distance, cfg.max_distance);
                changed = true;
            }
        }

        changed
    }

    /// Ease the current orbit toward the goal over `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        if self.config.damping <= 0.0 {
            self.current = self.goal;
            return;
        }
        let t = 1.0 - (-self.config.damping * 60.0 * dt).exp();
        self.current = self.current.lerp(&self.goal, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(config: ControlsConfig) -> OrbitController {
        OrbitController::new(config, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
    }

    fn undamped() -> ControlsConfig {
        ControlsConfig {
            damping: 0.0,
            ..ControlsConfig::default()
        }
    }

    #[test]
    fn test_initial_eye_matches_camera_position() {
        let ctrl = controller(ControlsConfig::default());
        assert!(ctrl.eye().distance(Vec3::new(0.0, 0.0, 5.0)) < 1e-5);
        assert_eq!(ctrl.current().distance, 5.0);
    }

    #[test]
    fn test_from_eye_round_trip_off_axis() {
        let eye = Vec3::new(3.0, 2.0, -4.0);
        let orbit = Orbit::from_eye(eye, Vec3::new(0.5, 0.0, 0.0));
        assert!(orbit.eye().distance(eye) < 1e-4);
    }

    #[test]
    fn test_pan_from_camera_straight_above() {
        let mut ctrl = OrbitController::new(undamped(), Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO);
        assert!(ctrl.current().elevation <= MAX_ELEVATION);

        ctrl.apply(&OrbitInput {
            pan: Vec2::new(10.0, 0.0),
            ..Default::default()
        });
        ctrl.advance(0.016);

        assert!(ctrl.focus().length() > 1e-3);
    }

    #[test]
    fn test_rotate_moves_eye_keeps_distance() {
        let mut ctrl = controller(undamped());
        assert!(ctrl.apply(&OrbitInput {
            rotate: Vec2::new(100.0, 0.0),
            ..Default::default()
        }));
        ctrl.advance(0.016);

        assert!((ctrl.current().azimuth + 0.5).abs() < 1e-5);
        assert!((ctrl.eye().length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_elevation_clamped() {
        let mut ctrl = controller(undamped());
        ctrl.apply(&OrbitInput {
            rotate: Vec2::new(0.0, 10_000.0),
            ..Default::default()
        });
        assert!(ctrl.goal().elevation <= MAX_ELEVATION);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut ctrl = controller(undamped());
        for _ in 0..200 {
            ctrl.apply(&OrbitInput {
                zoom: 5.0,
                ..Default::default()
            });
        }
        assert_eq!(ctrl.goal().distance, ctrl.config().min_distance);
    }

    #[test]
    fn test_pan_moves_focus_in_screen_plane() {
        let mut ctrl = controller(undamped());
        ctrl.apply(&OrbitInput {
            pan: Vec2::new(10.0, 0.0),
            ..Default::default()
        });
        ctrl.advance(0.016);

        let focus = ctrl.focus();
        assert!(focus.x < 0.0);
        assert!(focus.y.abs() < 1e-6);
        assert!(focus.z.abs() < 1e-6);
    }

    #[test]
    fn test_disabled_capabilities_ignore_input() {
        let mut ctrl = controller(ControlsConfig {
            enable_pan: false,
            enable_zoom: false,
            enable_rotate: false,
            ..undamped()
        });
        let before = *ctrl.goal();

        let consumed = ctrl.apply(&OrbitInput {
            rotate: Vec2::new(40.0, 20.0),
            pan: Vec2::new(-5.0, 8.0),
            zoom: 3.0,
            pinch: 0.5,
        });

        assert!(!consumed);
        assert_eq!(*ctrl.goal(), before);
    }

    #[test]
    fn test_damping_converges() {
        let mut ctrl = controller(ControlsConfig::default());
        ctrl.apply(&OrbitInput {
            zoom: 1.0,
            ..Default::default()
        });
        let goal = ctrl.goal().distance;

        ctrl.advance(0.016);
        assert!(ctrl.current().distance > goal);

        for _ in 0..600 {
            ctrl.advance(0.016);
        }
        assert!((ctrl.current().distance - goal).abs() < 1e-3);
    }

    #[test]
    fn test_idle_input() {
        let input = OrbitInput {
            ..Default::default()
        };
        assert!(input.is_idle());
    }
}
