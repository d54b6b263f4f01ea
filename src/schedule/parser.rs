use super::error::{ScheduleError, SegmentFault};
use super::segment::{SessionDurationSpec, TimingSegment};

const BREAK_MARKER: &str = "break";
const SECONDS_SUFFIX: &str = "sec";
const MINUTES_SUFFIX: &str = "min";

/// Parses duration text such as `"Warmup: 2x30sec + 1x5min break"`.
///
/// The whole text is rejected if any segment is malformed; a schedule is
/// never returned shorter than what was written.
pub fn parse(text: &str) -> Result<SessionDurationSpec, ScheduleError> {
    let body = strip_name(text).trim();
    if body.is_empty() {
        return Err(ScheduleError::EmptySpec);
    }

    let pieces: Vec<&str> = body.split('+').collect();
    if pieces.iter().all(|piece| piece.trim().is_empty()) {
        return Err(ScheduleError::EmptySpec);
    }

    let segments = pieces
        .into_iter()
        .map(parse_segment)
        .collect::<Result<Vec<_>, _>>()?;

    SessionDurationSpec::new(segments)
}

/// Inverse of [`parse`]. The name prefix is not part of the output.
pub fn serialize(spec: &SessionDurationSpec) -> String {
    spec.to_string()
}

// The grammar never contains ':', so the name ends at the last one.
fn strip_name(text: &str) -> &str {
    match text.rsplit_once(':') {
        Some((_, rest)) => rest,
        None => text,
    }
}

fn parse_segment(raw: &str) -> Result<TimingSegment, ScheduleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::malformed(raw, SegmentFault::Empty));
    }

    let (count, rest) = trimmed
        .split_once('x')
        .ok_or_else(|| ScheduleError::malformed(raw, SegmentFault::MissingRepeat))?;

    let repeat_count = parse_positive(count)
        .ok_or_else(|| ScheduleError::malformed(raw, SegmentFault::InvalidCount))?;

    let mut tokens: Vec<&str> = rest.split_whitespace().collect();
    let is_break = tokens.len() > 1 && tokens.last() == Some(&BREAK_MARKER);
    if is_break {
        tokens.pop();
    }
    let duration: String = tokens.concat();

    let (amount, multiplier) = if let Some(amount) = duration.strip_suffix(SECONDS_SUFFIX) {
        (amount, 1)
    } else if let Some(amount) = duration.strip_suffix(MINUTES_SUFFIX) {
        (amount, 60)
    } else {
        return Err(ScheduleError::malformed(raw, SegmentFault::MissingUnit));
    };

    let duration_secs = parse_positive(amount)
        .and_then(|value| value.checked_mul(multiplier))
        .ok_or_else(|| ScheduleError::malformed(raw, SegmentFault::InvalidDuration))?;

    TimingSegment::new(repeat_count, duration_secs, is_break)
        .map_err(|fault| ScheduleError::malformed(raw, fault))
}

fn parse_positive(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u32>().ok().filter(|parsed| *parsed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(spec: &SessionDurationSpec) -> Vec<(u32, u32, bool)> {
        spec.segments()
            .iter()
            .map(|s| (s.repeat_count(), s.duration_secs(), s.is_break()))
            .collect()
    }

    fn fault_of(text: &str) -> SegmentFault {
        match parse(text) {
            Err(ScheduleError::MalformedSegment { fault, .. }) => fault,
            other => panic!("expected malformed segment for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn parses_active_and_break_segments_in_order() {
        let spec = parse("2x30sec + 1x5min break").unwrap();
        assert_eq!(triples(&spec), vec![(2, 30, false), (1, 300, true)]);
    }

    #[test]
    fn strips_name_prefix() {
        let spec = parse("Warmup: 3x1min").unwrap();
        assert_eq!(triples(&spec), vec![(3, 60, false)]);
    }

    #[test]
    fn name_may_contain_colons() {
        let spec = parse("Day 2: evening: 1x45sec").unwrap();
        assert_eq!(triples(&spec), vec![(1, 45, false)]);
    }

    #[test]
    fn tolerates_whitespace_around_tokens() {
        let spec = parse("  4 x 30 sec+2x 2min   break  ").unwrap();
        assert_eq!(triples(&spec), vec![(4, 30, false), (2, 120, true)]);
    }

    #[test]
    fn empty_input_fails() {
        assert_eq!(parse(""), Err(ScheduleError::EmptySpec));
        assert_eq!(parse("   "), Err(ScheduleError::EmptySpec));
        assert_eq!(parse("Warmup: "), Err(ScheduleError::EmptySpec));
        assert_eq!(parse(" + "), Err(ScheduleError::EmptySpec));
    }

    #[test]
    fn unknown_unit_fails() {
        assert_eq!(fault_of("2xbadunit"), SegmentFault::MissingUnit);
        assert_eq!(fault_of("2x30"), SegmentFault::MissingUnit);
        assert_eq!(fault_of("2x30hours"), SegmentFault::MissingUnit);
    }

    #[test]
    fn missing_repeat_marker_fails() {
        assert_eq!(fault_of("30sec"), SegmentFault::MissingRepeat);
    }

    #[test]
    fn non_positive_numbers_fail() {
        assert_eq!(fault_of("0x30sec"), SegmentFault::InvalidCount);
        assert_eq!(fault_of("-1x30sec"), SegmentFault::InvalidCount);
        assert_eq!(fault_of("twox30sec"), SegmentFault::InvalidCount);
        assert_eq!(fault_of("2x0sec"), SegmentFault::InvalidDuration);
        assert_eq!(fault_of("2xfivemin"), SegmentFault::InvalidDuration);
        assert_eq!(fault_of("2x4294967295min"), SegmentFault::InvalidDuration);
    }

    #[test]
    fn one_bad_segment_rejects_everything() {
        let err = parse("2x30sec + 1xbogus + 1x5min break").unwrap_err();
        assert_eq!(
            err,
            ScheduleError::MalformedSegment {
                segment: "1xbogus".into(),
                fault: SegmentFault::MissingUnit,
            }
        );
    }

    #[test]
    fn dangling_separator_is_malformed() {
        assert_eq!(fault_of("2x30sec + "), SegmentFault::Empty);
        assert_eq!(fault_of("2x30sec ++ 1x1min"), SegmentFault::Empty);
    }

    #[test]
    fn break_marker_is_case_sensitive_and_separated() {
        assert_eq!(fault_of("1x5min Break"), SegmentFault::MissingUnit);
        assert_eq!(fault_of("1x5minbreak"), SegmentFault::MissingUnit);
    }

    #[test]
    fn serialized_form_parses_back_to_same_schedule() {
        for text in [
            "2x30sec + 1x5min break",
            "Warmup: 3x1min",
            "10x90sec + 1x120sec break + 2x10min",
            " 1 x 61 sec + 1x1sec break",
        ] {
            let first = parse(text).unwrap();
            let again = parse(&serialize(&first)).unwrap();
            assert_eq!(first, again, "round trip of {text:?}");
        }
    }
}
