//! Section selection: which thematic zone new pieces belong to.
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::DistanceCurve;
use crate::error::{Error, Result};
use crate::random::{pick_index, roll};

/// How the active section is chosen.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub enum SectionMode {
    /// Always section 0.
    #[default]
    None,
    /// Section id is the curve value at the spawn distance, truncated.
    Linear(DistanceCurve),
    /// With the curve's probability, jump to a uniformly random section in `start..=end`.
    ProbabilityRandom {
        probability: DistanceCurve,
        start: i32,
        end: i32,
    },
    /// With the curve's probability, advance to the next section, wrapping within `start..=end`.
    ProbabilityLoop {
        probability: DistanceCurve,
        start: i32,
        end: i32,
    },
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct SectionConfig {
    pub mode: SectionMode,
    /// Require a transition piece before the first piece of a new section.
    pub use_section_transitions: bool,
}

impl SectionConfig {
    pub fn new(mode: SectionMode) -> Self {
        Self {
            mode,
            use_section_transitions: false,
        }
    }

    pub fn with_section_transitions(mut self, enabled: bool) -> Self {
        self.use_section_transitions = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.mode {
            SectionMode::None => Ok(()),
            SectionMode::Linear(curve) => {
                if curve.is_empty() {
                    return Err(Error::InvalidConfig(
                        "linear section mode needs a non-empty curve".into(),
                    ));
                }
                Ok(())
            }
            SectionMode::ProbabilityRandom { start, end, .. }
            | SectionMode::ProbabilityLoop { start, end, .. } => {
                if start > end {
                    return Err(Error::InvalidConfig(format!(
                        "section range {start}..={end} is empty"
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Which spawn domain a section is requested for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionQuery {
    Platform,
    /// Scenery follows the section of the oldest live platform in its lane.
    Scene { first_platform_section: i32 },
}

#[derive(Clone, Debug)]
pub struct SectionSelector {
    config: SectionConfig,
    /// Platforms and scenery advance at different distances, so linear mode keeps a cursor each.
    scene_curve: Option<DistanceCurve>,
    platform_section: Option<i32>,
    scene_section: i32,
}

impl SectionSelector {
    pub fn new(config: SectionConfig) -> Self {
        let scene_curve = match &config.mode {
            SectionMode::Linear(curve) => Some(curve.clone()),
            _ => None,
        };
        Self {
            config,
            scene_curve,
            platform_section: None,
            scene_section: 0,
        }
    }

    pub fn config(&self) -> &SectionConfig {
        &self.config
    }

    #[inline]
    pub fn use_section_transitions(&self) -> bool {
        self.config.use_section_transitions
    }

    /// Last section handed out for the given domain.
    pub fn active_section(&self, is_scene: bool) -> i32 {
        if is_scene {
            self.scene_section
        } else {
            self.platform_section.unwrap_or(0)
        }
    }

    /// Section for the next piece spawned at `distance`.
    pub fn section(&mut self, distance: f32, query: SectionQuery, rng: &mut dyn Rng) -> i32 {
        let section = match (&mut self.config.mode, query) {
            (SectionMode::None, _) => 0,
            (SectionMode::Linear(curve), SectionQuery::Platform) => curve.value(distance) as i32,
            (SectionMode::Linear(_), SectionQuery::Scene { .. }) => self
                .scene_curve
                .as_mut()
                .map_or(0, |c| c.value(distance) as i32),
            (
                SectionMode::ProbabilityRandom { .. } | SectionMode::ProbabilityLoop { .. },
                SectionQuery::Scene {
                    first_platform_section,
                },
            ) => first_platform_section,
            (
                SectionMode::ProbabilityRandom {
                    probability,
                    start,
                    end,
                },
                SectionQuery::Platform,
            ) => {
                let current = self.platform_section.unwrap_or(*start);
                if roll(rng, probability.value(distance)) {
                    *start + pick_index(rng, (*end - *start + 1).max(1) as usize) as i32
                } else {
                    current
                }
            }
            (
                SectionMode::ProbabilityLoop {
                    probability,
                    start,
                    end,
                },
                SectionQuery::Platform,
            ) => {
                let current = self.platform_section;
                if roll(rng, probability.value(distance)) {
                    match current {
                        Some(s) if s >= *start && s < *end => s + 1,
                        _ => *start,
                    }
                } else {
                    current.unwrap_or(*start)
                }
            }
        };

        match query {
            SectionQuery::Platform => {
                if self.platform_section.is_some_and(|s| s != section) {
                    debug!(distance, section, "platform section changed");
                }
                self.platform_section = Some(section);
            }
            SectionQuery::Scene { .. } => self.scene_section = section,
        }
        section
    }

    pub fn reset(&mut self) {
        self.platform_section = None;
        self.scene_section = 0;
        match &mut self.config.mode {
            SectionMode::None => {}
            SectionMode::Linear(curve) => curve.reset(),
            SectionMode::ProbabilityRandom { probability, .. }
            | SectionMode::ProbabilityLoop { probability, .. } => probability.reset(),
        }
        if let Some(c) = self.scene_curve.as_mut() {
            c.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::curve::DistanceValue;
    use crate::random::tests::FixedRng;

    #[test]
    fn none_mode_is_always_zero() {
        let mut s = SectionSelector::new(SectionConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(s.section(1000.0, SectionQuery::Platform, &mut rng), 0);
    }

    #[test]
    fn loop_mode_cycles_through_range() {
        let mut s = SectionSelector::new(SectionConfig::new(SectionMode::ProbabilityLoop {
            probability: DistanceCurve::constant(1.0),
            start: 0,
            end: 2,
        }));
        let mut rng = StdRng::seed_from_u64(3);
        let seen: Vec<i32> = (0..7)
            .map(|i| s.section(i as f32 * 10.0, SectionQuery::Platform, &mut rng))
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn loop_mode_holds_without_trigger() {
        let mut s = SectionSelector::new(SectionConfig::new(SectionMode::ProbabilityLoop {
            probability: DistanceCurve::constant(0.0),
            start: 3,
            end: 5,
        }));
        let mut rng = StdRng::seed_from_u64(3);
        for d in [0.0, 10.0, 20.0] {
            assert_eq!(s.section(d, SectionQuery::Platform, &mut rng), 3);
        }
    }

    #[test]
    fn random_mode_stays_in_range() {
        let mut s = SectionSelector::new(SectionConfig::new(SectionMode::ProbabilityRandom {
            probability: DistanceCurve::constant(1.0),
            start: 2,
            end: 4,
        }));
        let mut rng = StdRng::seed_from_u64(99);
        for i in 0..100 {
            let section = s.section(i as f32, SectionQuery::Platform, &mut rng);
            assert!((2..=4).contains(&section));
        }
        assert_eq!(s.section(0.0, SectionQuery::Platform, &mut FixedRng { value: 0 }), 2);
    }

    #[test]
    fn scenes_follow_first_platform_in_probability_modes() {
        let mut s = SectionSelector::new(SectionConfig::new(SectionMode::ProbabilityRandom {
            probability: DistanceCurve::constant(1.0),
            start: 0,
            end: 9,
        }));
        let mut rng = StdRng::seed_from_u64(5);
        let query = SectionQuery::Scene {
            first_platform_section: 7,
        };
        assert_eq!(s.section(50.0, query, &mut rng), 7);
        assert_eq!(s.active_section(true), 7);
    }

    #[test]
    fn linear_mode_tracks_domains_independently() {
        let curve = DistanceCurve::new(vec![
            DistanceValue::new(0.0, 0.0, 100.0, 0.0, true),
            DistanceValue::new(100.0, 1.0, 200.0, 1.0, true),
        ]);
        let mut s = SectionSelector::new(SectionConfig::new(SectionMode::Linear(curve)));
        let mut rng = StdRng::seed_from_u64(5);
        let scene = SectionQuery::Scene {
            first_platform_section: 0,
        };

        assert_eq!(s.section(150.0, SectionQuery::Platform, &mut rng), 1);
        // The scene cursor was not advanced by the platform query.
        assert_eq!(s.section(50.0, scene, &mut rng), 0);
        assert_eq!(s.section(150.0, scene, &mut rng), 1);
    }

    #[test]
    fn reset_restarts_loop() {
        let mut s = SectionSelector::new(SectionConfig::new(SectionMode::ProbabilityLoop {
            probability: DistanceCurve::constant(1.0),
            start: 0,
            end: 2,
        }));
        let mut rng = StdRng::seed_from_u64(3);
        s.section(0.0, SectionQuery::Platform, &mut rng);
        s.section(10.0, SectionQuery::Platform, &mut rng);
        s.reset();
        assert_eq!(s.section(0.0, SectionQuery::Platform, &mut rng), 0);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let config = SectionConfig::new(SectionMode::ProbabilityLoop {
            probability: DistanceCurve::constant(1.0),
            start: 3,
            end: 1,
        });
        assert!(config.validate().is_err());
        assert!(SectionConfig::new(SectionMode::Linear(DistanceCurve::new(Vec::new())))
            .validate()
            .is_err());
    }
}
