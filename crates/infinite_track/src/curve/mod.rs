//! Piecewise-linear values over the traveled-distance domain.
//!
//! A [`DistanceCurve`] is an ordered list of [`DistanceValue`] segments. It drives every
//! distance-gated quantity in the crate: appearance probabilities, the no-collidable roll,
//! section transitions and linear section mapping.
//!
//! Lookups keep a cursor into the segment list so that monotonically increasing queries are
//! amortized O(1). Querying a smaller distance than the previous query (other than a loop
//! wraparound) rescans from the start of the list; results stay correct but the amortized
//! bound no longer holds.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

pub mod bezier;

pub use bezier::{CurveCursor, PlatformCurve};

/// A single segment interpolating from `start_value` to `end_value`.
///
/// When `uses_end` is false the segment is open-ended and yields `start_value` for every
/// distance at or past `start_distance`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceValue {
    pub start_distance: f32,
    pub start_value: f32,
    pub end_distance: f32,
    pub end_value: f32,
    pub uses_end: bool,
}

impl DistanceValue {
    pub fn new(
        start_distance: f32,
        start_value: f32,
        end_distance: f32,
        end_value: f32,
        uses_end: bool,
    ) -> Self {
        Self {
            start_distance,
            start_value,
            end_distance,
            end_value,
            uses_end,
        }
    }

    /// Open-ended segment holding `value` from `start_distance` onwards.
    pub fn constant(start_distance: f32, value: f32) -> Self {
        Self::new(start_distance, value, start_distance, value, false)
    }

    /// Interpolated value at `distance`, or 0 outside the segment.
    pub fn value(&self, distance: f32) -> f32 {
        if distance < self.start_distance || (self.uses_end && distance > self.end_distance) {
            return 0.0;
        }
        if !self.uses_end || self.start_distance == self.end_distance {
            return self.start_value;
        }

        let t = ((distance - self.start_distance) / (self.end_distance - self.start_distance))
            .clamp(0.0, 1.0);
        self.start_value + t * (self.end_value - self.start_value)
    }

    pub fn within(&self, distance: f32) -> bool {
        distance >= self.start_distance && (!self.uses_end || distance <= self.end_distance)
    }

    /// Upper bound used when searching for the segment covering a distance.
    fn search_end(&self) -> f32 {
        if self.uses_end {
            self.end_distance
        } else {
            f32::INFINITY
        }
    }
}

/// Ordered, non-overlapping list of [`DistanceValue`] segments.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct DistanceCurve {
    segments: Vec<DistanceValue>,
    /// Distance to wrap back to once the last segment's end is passed.
    loop_back_to: Option<f32>,
    /// Hold the last segment's end value past its end instead of dropping to 0.
    hold_past_end: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    cursor: usize,
    #[cfg_attr(feature = "serde", serde(skip))]
    last_query: Option<f32>,
}

impl DistanceCurve {
    /// Builds a curve, validating ordering and overlap.
    pub fn try_new(segments: Vec<DistanceValue>) -> Result<Self> {
        for (i, s) in segments.iter().enumerate() {
            if s.uses_end && s.end_distance < s.start_distance {
                return Err(Error::InvalidCurve(format!(
                    "segment {i} ends ({}) before it starts ({})",
                    s.end_distance, s.start_distance
                )));
            }
            if !s.uses_end && i + 1 != segments.len() {
                return Err(Error::InvalidCurve(format!(
                    "open-ended segment {i} must be the last segment"
                )));
            }
        }
        for (i, pair) in segments.windows(2).enumerate() {
            if pair[1].start_distance < pair[0].end_distance {
                return Err(Error::InvalidCurve(format!(
                    "segment {} starts at {} inside segment {i} ending at {}",
                    i + 1,
                    pair[1].start_distance,
                    pair[0].end_distance
                )));
            }
        }

        Ok(Self {
            segments,
            ..Default::default()
        })
    }

    /// Builds a curve without validation. Intended for literals known to be well-formed.
    pub fn new(segments: Vec<DistanceValue>) -> Self {
        debug_assert!(
            Self::try_new(segments.clone()).is_ok(),
            "segments must be sorted and non-overlapping"
        );
        Self {
            segments,
            ..Default::default()
        }
    }

    /// A curve yielding `value` at every non-negative distance.
    pub fn constant(value: f32) -> Self {
        Self::new(vec![DistanceValue::constant(0.0, value)])
    }

    /// Makes the curve repeat. Distances are taken modulo the last end distance; after a
    /// wraparound the lookup cursor restarts at the segment holding `loop_back_to`.
    pub fn looping(mut self, loop_back_to: f32) -> Result<Self> {
        let Some(last) = self.segments.last() else {
            return Err(Error::InvalidCurve("cannot loop an empty curve".into()));
        };
        if !last.uses_end {
            return Err(Error::InvalidCurve(
                "cannot loop a curve whose last segment is open-ended".into(),
            ));
        }
        if loop_back_to < 0.0 || loop_back_to >= last.end_distance {
            return Err(Error::InvalidCurve(format!(
                "loop-back distance {loop_back_to} must lie in [0, {})",
                last.end_distance
            )));
        }
        self.loop_back_to = Some(loop_back_to);
        Ok(self)
    }

    /// Holds the last segment's end value for distances past its end.
    pub fn with_hold_past_end(mut self, hold: bool) -> Self {
        self.hold_past_end = hold;
        self
    }

    pub fn segments(&self) -> &[DistanceValue] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_looping(&self) -> bool {
        self.loop_back_to.is_some()
    }

    /// Interpolated value at `distance`.
    pub fn value(&mut self, distance: f32) -> f32 {
        let Some(last) = self.segments.last().copied() else {
            return 0.0;
        };

        let distance = match self.loop_back_to {
            Some(_) if distance >= last.end_distance => distance % last.end_distance,
            _ => distance,
        };

        if let Some(prev) = self.last_query {
            if distance < prev {
                self.cursor = match self.loop_back_to {
                    Some(loop_back) if distance >= loop_back => self.loop_back_index(loop_back),
                    Some(_) => 0,
                    None => {
                        trace!("Distance curve rewound from {} to {}; rescanning.", prev, distance);
                        0
                    }
                };
            }
        }
        self.last_query = Some(distance);

        if self.hold_past_end && last.uses_end && distance > last.end_distance {
            return last.end_value;
        }

        let index = self.index_for(distance);
        self.segments[index].value(distance)
    }

    /// True when `distance` lies between the first start and the last end.
    pub fn within_range(&self, distance: f32) -> bool {
        let (Some(first), Some(last)) = (self.segments.first(), self.segments.last()) else {
            return false;
        };
        let open_ended = self.loop_back_to.is_some() || self.hold_past_end || !last.uses_end;
        distance >= first.start_distance && (open_ended || distance <= last.end_distance)
    }

    /// Smallest and largest value any segment endpoint takes.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for s in &self.segments {
            min = min.min(s.start_value);
            max = max.max(s.start_value);
            if s.uses_end {
                min = min.min(s.end_value);
                max = max.max(s.end_value);
            }
        }
        (min, max)
    }

    /// Clears the lookup cursor.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.last_query = None;
    }

    fn index_for(&mut self, distance: f32) -> usize {
        for i in self.cursor..self.segments.len() {
            if distance <= self.segments[i].search_end() {
                self.cursor = i;
                return i;
            }
        }
        self.segments.len() - 1
    }

    fn loop_back_index(&self, loop_back: f32) -> usize {
        self.segments
            .iter()
            .position(|s| loop_back <= s.search_end())
            .unwrap_or(0)
    }
}
