use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::{ScheduleError, SegmentFault};

/// `repeat_count` consecutive steps of `duration_secs` each. Break segments
/// show no image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingSegment {
    repeat_count: u32,
    duration_secs: u32,
    is_break: bool,
}

impl TimingSegment {
    pub fn new(repeat_count: u32, duration_secs: u32, is_break: bool) -> Result<Self, SegmentFault> {
        if repeat_count == 0 {
            return Err(SegmentFault::InvalidCount);
        }
        if duration_secs == 0 {
            return Err(SegmentFault::InvalidDuration);
        }
        Ok(Self {
            repeat_count,
            duration_secs,
            is_break,
        })
    }

    pub fn active(repeat_count: u32, duration_secs: u32) -> Result<Self, SegmentFault> {
        Self::new(repeat_count, duration_secs, false)
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn is_break(&self) -> bool {
        self.is_break
    }
}

impl fmt::Display for TimingSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.duration_secs % 60 == 0 {
            write!(f, "{}x{}min", self.repeat_count, self.duration_secs / 60)?;
        } else {
            write!(f, "{}x{}sec", self.repeat_count, self.duration_secs)?;
        }
        if self.is_break {
            f.write_str(" break")?;
        }
        Ok(())
    }
}

/// Where the schedule stands after some number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulePosition {
    pub segment_index: usize,
    pub steps_in_segment: u32,
}

/// Ordered, non-empty, circular list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionDurationSpec {
    segments: Vec<TimingSegment>,
}

impl SessionDurationSpec {
    pub fn new(segments: Vec<TimingSegment>) -> Result<Self, ScheduleError> {
        if segments.is_empty() {
            return Err(ScheduleError::EmptySpec);
        }
        Ok(Self { segments })
    }

    /// One active segment covering every image once per pass.
    pub fn fixed_interval(image_count: usize, duration_secs: u32) -> Result<Self, SegmentFault> {
        let repeat_count = u32::try_from(image_count)
            .map_err(|_| SegmentFault::InvalidCount)?;
        let segment = TimingSegment::active(repeat_count, duration_secs)?;
        Ok(Self {
            segments: vec![segment],
        })
    }

    pub fn segments(&self) -> &[TimingSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> &TimingSegment {
        &self.segments[index % self.segments.len()]
    }

    pub fn has_active_segment(&self) -> bool {
        self.segments.iter().any(|segment| !segment.is_break())
    }

    /// Number of steps in one full pass over every segment.
    pub fn cycle_len(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| u64::from(segment.repeat_count()))
            .sum()
    }

    /// Total seconds of one full cycle.
    pub fn cycle_secs(&self) -> u64 {
        self.segments
            .iter()
            .map(|segment| u64::from(segment.repeat_count()) * u64::from(segment.duration_secs()))
            .sum()
    }

    /// Replays the schedule from the first step and reports where it lands
    /// after `steps` advances. The cycle repeats, so only the remainder of
    /// one cycle is simulated.
    pub fn position_at(&self, steps: u64) -> SchedulePosition {
        let mut remaining = steps % self.cycle_len();
        let mut position = SchedulePosition::default();

        while remaining > 0 {
            let repeat = u64::from(self.segments[position.segment_index].repeat_count());
            let left_in_segment = repeat - u64::from(position.steps_in_segment);
            if remaining < left_in_segment {
                position.steps_in_segment += remaining as u32;
                break;
            }
            remaining -= left_in_segment;
            position.segment_index = (position.segment_index + 1) % self.segments.len();
            position.steps_in_segment = 0;
        }

        position
    }
}

impl fmt::Display for SessionDurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for SessionDurationSpec {
    type Err = ScheduleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        super::parser::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(segments: &[(u32, u32, bool)]) -> SessionDurationSpec {
        SessionDurationSpec::new(
            segments
                .iter()
                .map(|&(count, secs, is_break)| TimingSegment::new(count, secs, is_break).unwrap())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_eq!(TimingSegment::new(0, 30, false), Err(SegmentFault::InvalidCount));
        assert_eq!(TimingSegment::new(2, 0, true), Err(SegmentFault::InvalidDuration));
    }

    #[test]
    fn empty_segment_list_is_rejected() {
        assert_eq!(SessionDurationSpec::new(Vec::new()), Err(ScheduleError::EmptySpec));
    }

    #[test]
    fn display_prefers_minutes_when_exact() {
        let spec = spec(&[(2, 30, false), (1, 300, true), (3, 90, false)]);
        assert_eq!(spec.to_string(), "2x30sec + 1x5min break + 3x90sec");
    }

    #[test]
    fn cycle_totals() {
        let spec = spec(&[(2, 30, false), (1, 300, true)]);
        assert_eq!(spec.cycle_len(), 3);
        assert_eq!(spec.cycle_secs(), 360);
    }

    #[test]
    fn position_at_walks_segments_and_wraps() {
        let spec = spec(&[(2, 30, false), (1, 300, true), (3, 60, false)]);

        let expected = [
            (0, 0),
            (0, 1),
            (1, 0),
            (2, 0),
            (2, 1),
            (2, 2),
            (0, 0),
            (0, 1),
        ];
        for (steps, &(segment_index, steps_in_segment)) in expected.iter().enumerate() {
            assert_eq!(
                spec.position_at(steps as u64),
                SchedulePosition {
                    segment_index,
                    steps_in_segment
                },
                "after {steps} steps"
            );
        }
    }

    #[test]
    fn fixed_interval_is_single_active_segment() {
        let spec = SessionDurationSpec::fixed_interval(4, 45).unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec.segment(0).repeat_count(), 4);
        assert!(!spec.segment(0).is_break());
        assert!(SessionDurationSpec::fixed_interval(0, 45).is_err());
    }
}
