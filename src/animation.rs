//! Per-frame color oscillation.
//!
//! Each frame moves six color channels by a fixed step. Vertex 0 trades red
//! for green, vertex 1 trades green for blue and vertex 2 trades blue for
//! red. Vertex 0's green channel decides when the whole set turns around.

use crate::renderer::vertex::{Color, COLORS};

pub const DEFAULT_STEP: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

/// (vertex, channel, sign while rising)
const MOVES: [(usize, usize, f32); 6] = [
    (0, 0, -1.0),
    (0, 1, 1.0),
    (1, 1, -1.0),
    (1, 2, 1.0),
    (2, 0, 1.0),
    (2, 2, -1.0),
];

#[derive(Debug, Clone)]
pub struct ColorAnimation {
    colors: [Color; 3],
    direction: Direction,
    step: f32,
}

impl ColorAnimation {
    pub fn new(step: f32) -> Self {
        ColorAnimation {
            colors: COLORS,
            direction: Direction::Rising,
            step,
        }
    }

    pub fn colors(&self) -> &[Color; 3] {
        &self.colors
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Colors to draw this frame. The animation moves on once they are taken.
    pub fn advance(&mut self) -> [Color; 3] {
        let drawn = self.colors;
        self.step();
        drawn
    }

    pub fn step(&mut self) {
        let delta = match self.direction {
            Direction::Rising => self.step,
            Direction::Falling => -self.step,
        };
        for &(vertex, channel, sign) in MOVES.iter() {
            self.colors[vertex][channel] += sign * delta;
        }

        // vertex 0 green drives the turnaround
        let pivot = self.colors[0][1];
        let turned = match self.direction {
            Direction::Rising if pivot >= 1.0 => Some(Direction::Falling),
            Direction::Falling if pivot <= 0.0 => Some(Direction::Rising),
            _ => None,
        };
        if let Some(direction) = turned {
            log::debug!("color animation now {:?} at {}", direction, pivot);
            self.direction = direction;
        }
    }
}

impl Default for ColorAnimation {
    fn default() -> Self {
        ColorAnimation::new(DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn first_step_moves_six_channels() {
        let mut anim = ColorAnimation::default();
        anim.step();
        let c = anim.colors();
        assert!(close(c[0][0], 0.995));
        assert!(close(c[0][1], 0.005));
        assert!(close(c[0][2], 0.0));
        assert!(close(c[1][0], 0.0));
        assert!(close(c[1][1], 0.995));
        assert!(close(c[1][2], 0.005));
        assert!(close(c[2][0], 0.005));
        assert!(close(c[2][1], 0.0));
        assert!(close(c[2][2], 0.995));
        assert_eq!(anim.direction(), Direction::Rising);
    }

    #[test]
    fn first_frame_draws_initial_colors() {
        let mut anim = ColorAnimation::default();
        assert_eq!(anim.advance(), COLORS);
        let second = anim.advance();
        assert!(close(second[0][0], 0.995));
        assert!(close(second[0][1], 0.005));
        // the third frame's colors are already staged
        assert!(close(anim.colors()[0][1], 0.01));
    }

    #[test]
    fn alpha_never_changes() {
        let mut anim = ColorAnimation::new(0.01);
        for _ in 0..1000 {
            anim.step();
            for color in anim.colors() {
                assert_eq!(color[3], 1.0);
            }
        }
    }

    #[test]
    fn reverses_at_both_bounds() {
        let mut anim = ColorAnimation::default();
        let mut frames = 0;
        while anim.direction() == Direction::Rising {
            anim.step();
            frames += 1;
            assert!(frames <= 201, "never turned to falling");
        }
        assert!(anim.colors()[0][1] >= 1.0);
        assert!(frames >= 200);

        frames = 0;
        while anim.direction() == Direction::Falling {
            anim.step();
            frames += 1;
            assert!(frames <= 202, "never turned to rising");
        }
        assert!(anim.colors()[0][1] <= 0.0);
    }

    #[test]
    fn channels_stay_within_one_step_of_bounds() {
        let step = 0.005;
        let mut anim = ColorAnimation::new(step);
        for _ in 0..5000 {
            anim.step();
            for color in anim.colors() {
                for &value in &color[..3] {
                    assert!(value >= -step - EPS && value <= 1.0 + step + EPS);
                }
            }
        }
    }

    #[test]
    fn full_cycle_returns_near_start() {
        let mut anim = ColorAnimation::new(0.25);
        // rising: 4 steps to reach 1.0, falling: 4 steps back to 0.0
        for _ in 0..8 {
            anim.step();
        }
        assert_eq!(anim.direction(), Direction::Rising);
        for (got, want) in anim.colors().iter().zip(COLORS.iter()) {
            for i in 0..4 {
                assert!(close(got[i], want[i]), "{:?} != {:?}", got, want);
            }
        }
    }
}
