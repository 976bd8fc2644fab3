//! Curved platforms built from chained quadratic Bezier pieces.
//!
//! Control points are given in the platform's local space. Interior pieces start and end at
//! the midpoints between consecutive control points, so the chain is C1-continuous. An
//! arc-length table maps traveled distance to a piece and a local parameter.
use glam::Vec3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ARC_LENGTH_STEPS: usize = 16;

/// Quadratic Bezier point `p0(1-t)^2 + 2 p1 t(1-t) + p2 t^2`.
#[inline]
pub fn quadratic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * t * u) + p2 * (t * t)
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct PlatformCurve {
    control_points: Vec<Vec3>,
    /// Cumulative arc length at the end of each piece.
    distance_map: Vec<f32>,
}

/// Follower state for monotonic traversal of a [`PlatformCurve`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CurveCursor {
    piece: usize,
}

impl CurveCursor {
    pub fn reset(&mut self) {
        self.piece = 0;
    }
}

impl PlatformCurve {
    pub fn try_new(control_points: Vec<Vec3>) -> Result<Self> {
        if control_points.len() < 3 {
            return Err(Error::InvalidCurve(format!(
                "a platform curve needs at least 3 control points, got {}",
                control_points.len()
            )));
        }

        let mut curve = Self {
            control_points,
            distance_map: Vec::new(),
        };
        let mut total = 0.0;
        for piece in 0..curve.piece_count() {
            let (p0, p1, p2) = curve.piece_points(piece);
            let mut prev = p0;
            for step in 1..=ARC_LENGTH_STEPS {
                let p = quadratic_bezier(p0, p1, p2, step as f32 / ARC_LENGTH_STEPS as f32);
                total += p.distance(prev);
                prev = p;
            }
            curve.distance_map.push(total);
        }
        if total <= 0.0 {
            return Err(Error::InvalidCurve("platform curve has zero length".into()));
        }

        Ok(curve)
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    /// Total arc length of the curve.
    pub fn length(&self) -> f32 {
        self.distance_map.last().copied().unwrap_or(0.0)
    }

    pub fn piece_count(&self) -> usize {
        self.control_points.len() - 2
    }

    /// Local-space point `distance` along the curve, advancing `cursor` at most one piece.
    ///
    /// Callers advance by small per-tick steps, so a single-piece advance keeps up with the
    /// follower while never skipping backwards.
    pub fn point_at(&self, distance: f32, cursor: &mut CurveCursor) -> Vec3 {
        let mut piece = cursor.piece.min(self.piece_count() - 1);
        if distance > self.distance_map[piece] && piece + 1 < self.piece_count() {
            piece += 1;
            cursor.piece = piece;
        }
        self.point_in_piece(piece, distance)
    }

    /// Local-space point `distance` along the curve, searching the whole table.
    pub fn point_at_distance(&self, distance: f32) -> Vec3 {
        let piece = self
            .distance_map
            .partition_point(|&end| end < distance)
            .min(self.piece_count() - 1);
        self.point_in_piece(piece, distance)
    }

    fn point_in_piece(&self, piece: usize, distance: f32) -> Vec3 {
        let start = if piece == 0 {
            0.0
        } else {
            self.distance_map[piece - 1]
        };
        let span = self.distance_map[piece] - start;
        let t = if span > 0.0 {
            ((distance - start) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (p0, p1, p2) = self.piece_points(piece);
        quadratic_bezier(p0, p1, p2, t)
    }

    fn piece_points(&self, piece: usize) -> (Vec3, Vec3, Vec3) {
        let cp = &self.control_points;
        let p0 = if piece == 0 {
            cp[0]
        } else {
            (cp[piece] + cp[piece + 1]) * 0.5
        };
        let p1 = cp[piece + 1];
        let p2 = if piece + 2 == cp.len() - 1 {
            cp[piece + 2]
        } else {
            (cp[piece + 1] + cp[piece + 2]) * 0.5
        };
        (p0, p1, p2)
    }
}
