//! Platform motion kinds
//!
//! Each motion advances its own progress state by `dt` and returns the new
//! platform position. Velocities are not produced here; the dynamic body
//! derives them from the resulting transform delta.

use crate::foundation::math::{constants, utils, Vec3};

/// Straight-line motion between two points
#[derive(Debug, Clone, PartialEq)]
pub struct LinearMotion {
    /// Segment start
    pub start: Vec3,
    /// Segment end
    pub end: Vec3,
    /// Travel speed in units per second
    pub speed: f32,
    /// Reverse at the ends instead of jumping back to the start
    pub ping_pong: bool,
    /// Distance travelled from `start`, in `[0, length]`
    pub current_time: f32,
    /// `1.0` while heading to `end`, `-1.0` while heading back
    pub direction: f32,
}

impl LinearMotion {
    /// Ping-pong motion starting at `start`
    pub fn new(start: Vec3, end: Vec3, speed: f32) -> Self {
        Self {
            start,
            end,
            speed,
            ping_pong: true,
            current_time: 0.0,
            direction: 1.0,
        }
    }

    /// Builder pattern: Wrap around to the start at the end of the segment
    pub fn looping(mut self) -> Self {
        self.ping_pong = false;
        self
    }

    /// Length of the segment
    pub fn length(&self) -> f32 {
        (self.end - self.start).magnitude()
    }

    /// Position for the current progress
    pub fn position(&self) -> Vec3 {
        let length = self.length();
        if length <= constants::EPSILON {
            return self.start;
        }
        self.start + (self.end - self.start) * (self.current_time / length)
    }

    /// Advance by `dt` seconds and return the new position
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        let length = self.length();
        if length <= constants::EPSILON {
            return self.start;
        }

        let travel = self.speed * dt;
        if self.ping_pong {
            // Unfold the back-and-forth path onto a loop of twice the length
            let cycle = 2.0 * length;
            let phase = if self.direction >= 0.0 {
                self.current_time
            } else {
                cycle - self.current_time
            };
            let phase = (phase + travel).rem_euclid(cycle);
            if phase <= length {
                self.current_time = phase;
                self.direction = 1.0;
            } else {
                self.current_time = cycle - phase;
                self.direction = -1.0;
            }
        } else {
            self.current_time = (self.current_time + travel).rem_euclid(length);
            self.direction = 1.0;
        }

        self.position()
    }
}

/// Motion around a circle in one of the cardinal planes
#[derive(Debug, Clone, PartialEq)]
pub struct CircularMotion {
    /// Circle center
    pub center: Vec3,
    /// Circle radius
    pub radius: f32,
    /// Angular speed in radians per second
    pub angular_speed: f32,
    /// Normal of the circle; its dominant component picks the plane
    pub axis: Vec3,
    /// Current angle in `[0, TAU)`
    pub angle: f32,
}

impl CircularMotion {
    /// Circle in the plane perpendicular to the dominant component of `axis`
    pub fn new(center: Vec3, radius: f32, angular_speed: f32, axis: Vec3) -> Self {
        Self {
            center,
            radius,
            angular_speed,
            axis,
            angle: 0.0,
        }
    }

    /// Position for the current angle
    pub fn position(&self) -> Vec3 {
        let (c, s) = (self.angle.cos() * self.radius, self.angle.sin() * self.radius);
        let ax = self.axis.abs();
        let offset = if ax.y >= ax.x && ax.y >= ax.z {
            Vec3::new(c, 0.0, s)
        } else if ax.x >= ax.z {
            Vec3::new(0.0, c, s)
        } else {
            Vec3::new(c, s, 0.0)
        };
        self.center + offset
    }

    /// Advance by `dt` seconds and return the new position
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.angle = utils::wrap_angle(self.angle + self.angular_speed * dt);
        self.position()
    }
}

/// How a platform moves
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlatformMotion {
    /// Does not move
    #[default]
    Static,
    /// Back and forth, or looping, along a segment
    Linear(LinearMotion),
    /// Around a circle
    Circular(CircularMotion),
    /// Moved by game code through the transform
    Custom,
}

impl PlatformMotion {
    /// Advance the motion and return the new position, `None` when the
    /// motion does not drive the position
    pub fn advance(&mut self, dt: f32) -> Option<Vec3> {
        match self {
            Self::Static | Self::Custom => None,
            Self::Linear(linear) => Some(linear.advance(dt)),
            Self::Circular(circular) => Some(circular.advance(dt)),
        }
    }

    /// Position for the current progress, `None` when not driven
    pub fn position(&self) -> Option<Vec3> {
        match self {
            Self::Static | Self::Custom => None,
            Self::Linear(linear) => Some(linear.position()),
            Self::Circular(circular) => Some(circular.position()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn step(motion: &mut LinearMotion, seconds: f32) -> Vec3 {
        let dt = 1.0 / 60.0;
        let mut position = motion.position();
        for _ in 0..(seconds / dt).round() as usize {
            position = motion.advance(dt);
        }
        position
    }

    #[test]
    fn test_linear_ping_pong_scenario() {
        let mut motion = LinearMotion::new(Vec3::zeros(), Vec3::new(10.0, 0.0, 0.0), 5.0);

        let position = step(&mut motion, 1.0);
        assert_relative_eq!(position, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-3);
        assert_relative_eq!(motion.current_time, 5.0, epsilon = 1e-3);
        assert_eq!(motion.direction, 1.0);

        // Two more seconds: reach the end at t=2 and come back halfway
        let position = step(&mut motion, 2.0);
        assert_relative_eq!(position, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-3);
        assert_eq!(motion.direction, -1.0);
    }

    #[test]
    fn test_linear_reflection_in_one_large_step() {
        let mut motion = LinearMotion::new(Vec3::zeros(), Vec3::new(4.0, 0.0, 0.0), 1.0);
        let position = motion.advance(5.0);
        assert_relative_eq!(position, Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(motion.direction, -1.0);

        // Keeps heading back, then turns around at the start
        let position = motion.advance(4.0);
        assert_relative_eq!(position, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(motion.direction, 1.0);
    }

    #[test]
    fn test_linear_loop_wraps() {
        let mut motion = LinearMotion::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 4.0), 2.0).looping();
        let position = motion.advance(2.5);
        assert_relative_eq!(position, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
        assert_eq!(motion.direction, 1.0);
    }

    #[test]
    fn test_zero_length_segment_stays_put() {
        let start = Vec3::new(1.0, 2.0, 3.0);
        let mut motion = LinearMotion::new(start, start, 3.0);
        assert_relative_eq!(motion.advance(1.0), start);
        assert_eq!(motion.current_time, 0.0);
    }

    #[test]
    fn test_circular_plane_follows_dominant_axis() {
        let quarter = std::f32::consts::FRAC_PI_2;

        let mut horizontal = CircularMotion::new(Vec3::zeros(), 2.0, quarter, Vec3::new(0.1, 1.0, 0.0));
        assert_relative_eq!(horizontal.advance(1.0), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-5);

        let mut side = CircularMotion::new(Vec3::zeros(), 2.0, quarter, Vec3::x());
        assert_relative_eq!(side.advance(1.0), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-5);
        assert_relative_eq!(side.position(), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-5);

        let mut front = CircularMotion::new(Vec3::zeros(), 2.0, quarter, -Vec3::z());
        assert_relative_eq!(front.advance(1.0), Vec3::new(0.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_circular_angle_wraps() {
        let mut motion = CircularMotion::new(Vec3::zeros(), 1.0, -1.0, Vec3::y());
        motion.advance(1.0);
        assert!(motion.angle >= 0.0 && motion.angle < constants::TAU);
        assert_relative_eq!(motion.angle, constants::TAU - 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_static_and_custom_do_not_drive() {
        assert_eq!(PlatformMotion::Static.advance(1.0), None);
        assert_eq!(PlatformMotion::Custom.position(), None);
    }
}
