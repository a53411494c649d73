//! Hazard motion strategies.

use glam::Vec2;
use std::f32::consts::TAU;

/// Duration of one 60 fps frame; hazard speeds are expressed per frame.
pub const HAZARD_FRAME_MS: f32 = 1000.0 / 60.0;

/// Closed analytic path traced by an orbiting hazard as its angle grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitPath {
    Circle { radius: f32 },
    Ellipse { semi_major: f32, semi_minor: f32 },
    /// Radius breathes between `inner` and `outer`; closes over 4π.
    Spiral { inner: f32, outer: f32 },
    /// Lemniscate of Gerono.
    FigureEight { size: f32 },
}

impl OrbitPath {
    /// Offset from the orbit centre at `angle`.
    pub fn offset(&self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        match *self {
            OrbitPath::Circle { radius } => Vec2::new(cos, sin) * radius,
            OrbitPath::Ellipse {
                semi_major,
                semi_minor,
            } => Vec2::new(cos * semi_major, sin * semi_minor),
            OrbitPath::Spiral { inner, outer } => {
                let breath = (1.0 - (angle / 2.0).cos()) / 2.0;
                Vec2::new(cos, sin) * (inner + (outer - inner) * breath)
            }
            OrbitPath::FigureEight { size } => Vec2::new(cos * size, sin * cos * size),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Static,
    /// Position is derived from `angle` every step, never integrated.
    Orbital {
        center: Vec2,
        path: OrbitPath,
        angle: f32,
        /// Radians per 60 fps frame.
        angular_speed: f32,
    },
    /// Units per 60 fps frame.
    Kinematic { velocity: Vec2 },
}

impl Motion {
    /// Advance by `dt_ms` and write the resulting position.
    pub fn advance(&mut self, position: &mut Vec2, dt_ms: f32) {
        let frames = dt_ms / HAZARD_FRAME_MS;
        match self {
            Motion::Static => {}
            Motion::Orbital {
                center,
                path,
                angle,
                angular_speed,
            } => {
                // Spiral closes over 4π, so wrap there for every path.
                *angle = (*angle + *angular_speed * frames) % (2.0 * TAU);
                *position = *center + path.offset(*angle);
            }
            Motion::Kinematic { velocity } => {
                *position += *velocity * frames;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_circle_orbit() {
        let mut motion = Motion::Orbital {
            center: Vec2::new(100.0, 100.0),
            path: OrbitPath::Circle { radius: 50.0 },
            angle: 0.0,
            angular_speed: std::f32::consts::FRAC_PI_2,
        };
        let mut pos = Vec2::ZERO;
        motion.advance(&mut pos, 0.0);
        assert!(close(pos, Vec2::new(150.0, 100.0)));
        motion.advance(&mut pos, HAZARD_FRAME_MS);
        assert!(close(pos, Vec2::new(100.0, 150.0)));
    }

    #[test]
    fn test_paths_are_closed() {
        let paths = [
            OrbitPath::Circle { radius: 10.0 },
            OrbitPath::Ellipse {
                semi_major: 20.0,
                semi_minor: 5.0,
            },
            OrbitPath::Spiral {
                inner: 10.0,
                outer: 40.0,
            },
            OrbitPath::FigureEight { size: 30.0 },
        ];
        for path in paths {
            assert!(close(path.offset(0.0), path.offset(2.0 * TAU)), "{path:?}");
        }
    }

    #[test]
    fn test_spiral_breathes_between_bounds() {
        let path = OrbitPath::Spiral {
            inner: 10.0,
            outer: 40.0,
        };
        assert!((path.offset(0.0).length() - 10.0).abs() < 1e-3);
        assert!((path.offset(TAU).length() - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_figure_eight_crosses_centre() {
        let path = OrbitPath::FigureEight { size: 30.0 };
        assert!(close(path.offset(std::f32::consts::FRAC_PI_2), Vec2::ZERO));
    }

    #[test]
    fn test_kinematic_scaled_to_frames() {
        let mut motion = Motion::Kinematic {
            velocity: Vec2::new(3.0, -1.0),
        };
        let mut pos = Vec2::new(10.0, 10.0);
        motion.advance(&mut pos, HAZARD_FRAME_MS * 2.0);
        assert!(close(pos, Vec2::new(16.0, 8.0)));
    }

    #[test]
    fn test_static_never_moves() {
        let mut pos = Vec2::new(5.0, 5.0);
        Motion::Static.advance(&mut pos, 1000.0);
        assert_eq!(pos, Vec2::new(5.0, 5.0));
    }
}
