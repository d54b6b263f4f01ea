//! Structured segment input, as collected by a segment-builder form.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ScheduleError, SegmentFault};
use super::segment::{SessionDurationSpec, TimingSegment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
}

impl TimeUnit {
    fn multiplier(self) -> u32 {
        match self {
            TimeUnit::Seconds => 1,
            TimeUnit::Minutes => 60,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "sec" | "secs" | "seconds" | "s" => Ok(TimeUnit::Seconds),
            "min" | "mins" | "minutes" | "m" => Ok(TimeUnit::Minutes),
            other => Err(format!("unknown time unit '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    #[default]
    Active,
    Break,
}

impl FromStr for SegmentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "active" => Ok(SegmentKind::Active),
            "break" => Ok(SegmentKind::Break),
            other => Err(format!("unknown segment type '{other}'")),
        }
    }
}

/// One row of the builder: `(count, duration, unit, type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDraft {
    pub count: u32,
    pub duration: u32,
    pub unit: TimeUnit,
    pub kind: SegmentKind,
}

impl SegmentDraft {
    pub fn to_segment(&self) -> Result<TimingSegment, SegmentFault> {
        let duration_secs = self
            .duration
            .checked_mul(self.unit.multiplier())
            .ok_or(SegmentFault::InvalidDuration)?;
        TimingSegment::new(self.count, duration_secs, self.kind == SegmentKind::Break)
    }
}

/// Accepts `count,duration,unit[,type]`, e.g. `2,30,sec` or `1,5,min,break`.
impl FromStr for SegmentDraft {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(format!(
                "expected 'count,duration,unit[,active|break]', got '{value}'"
            ));
        }

        let count = parts[0]
            .parse::<u32>()
            .map_err(|_| format!("invalid count '{}'", parts[0]))?;
        let duration = parts[1]
            .parse::<u32>()
            .map_err(|_| format!("invalid duration '{}'", parts[1]))?;
        let unit = parts[2].parse::<TimeUnit>()?;
        let kind = match parts.get(3) {
            Some(kind) => kind.parse::<SegmentKind>()?,
            None => SegmentKind::Active,
        };

        Ok(Self {
            count,
            duration,
            unit,
            kind,
        })
    }
}

/// Validates builder rows and assembles them into a schedule, in row order.
pub fn build(drafts: &[SegmentDraft]) -> Result<SessionDurationSpec, ScheduleError> {
    let segments = drafts
        .iter()
        .map(|draft| {
            draft.to_segment().map_err(|fault| ScheduleError::MalformedSegment {
                segment: format!(
                    "{}x{}{}",
                    draft.count,
                    draft.duration,
                    match draft.unit {
                        TimeUnit::Seconds => "sec",
                        TimeUnit::Minutes => "min",
                    }
                ),
                fault,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    SessionDurationSpec::new(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::parse;

    #[test]
    fn builder_rows_serialize_into_parser_grammar() {
        let drafts = [
            "2,30,sec".parse::<SegmentDraft>().unwrap(),
            "1,5,min,break".parse::<SegmentDraft>().unwrap(),
            "3,90,seconds,active".parse::<SegmentDraft>().unwrap(),
        ];
        let spec = build(&drafts).unwrap();
        let text = spec.to_string();

        assert_eq!(text, "2x30sec + 1x5min break + 3x90sec");
        assert_eq!(parse(&text).unwrap(), spec);
    }

    #[test]
    fn no_rows_is_an_empty_spec() {
        assert_eq!(build(&[]), Err(ScheduleError::EmptySpec));
    }

    #[test]
    fn zero_count_row_is_rejected() {
        let draft = "0,30,sec".parse::<SegmentDraft>().unwrap();
        assert!(matches!(
            build(&[draft]),
            Err(ScheduleError::MalformedSegment {
                fault: SegmentFault::InvalidCount,
                ..
            })
        ));
    }

    #[test]
    fn bad_row_text_is_rejected() {
        assert!("2,30".parse::<SegmentDraft>().is_err());
        assert!("2,30,hours".parse::<SegmentDraft>().is_err());
        assert!("2,30,sec,nap".parse::<SegmentDraft>().is_err());
        assert!("x,30,sec".parse::<SegmentDraft>().is_err());
    }
}
