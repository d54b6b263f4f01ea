//! Errors produced while turning duration text into a schedule.

/// Why a single segment could not be decomposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SegmentFault {
    #[error("segment is empty")]
    Empty,

    #[error("expected '<count>x<duration><unit>'")]
    MissingRepeat,

    #[error("repeat count must be a positive integer")]
    InvalidCount,

    #[error("duration must end in 'sec' or 'min'")]
    MissingUnit,

    #[error("duration must be a positive integer")]
    InvalidDuration,
}

/// Errors returned by [`crate::schedule::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("session duration is empty")]
    EmptySpec,

    #[error("malformed segment '{segment}': {fault}")]
    MalformedSegment { segment: String, fault: SegmentFault },
}

impl ScheduleError {
    pub(crate) fn malformed(segment: &str, fault: SegmentFault) -> Self {
        ScheduleError::MalformedSegment {
            segment: segment.trim().to_string(),
            fault,
        }
    }
}
