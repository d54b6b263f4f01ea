use sketchtimer_lib::{
    player::{PlayerOptions, PlayerStatus, SessionPlayer, TickOutcome},
    schedule::{parse, serialize, ScheduleError, SegmentFault},
};

const SCHEDULES: &[&str] = &[
    "1x30sec",
    "5x1min",
    "2x30sec + 1x5min break",
    "1x10sec break + 3x20sec",
    "Long poses: 2x1min + 1x30sec break + 4x45sec + 2x2min break",
    "1x5sec + 1x5sec break + 1x5sec + 1x5sec break",
];

fn images(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("img-{i}.jpg")).collect()
}

fn seeded(shuffle: bool) -> PlayerOptions {
    PlayerOptions {
        shuffle,
        seed: Some(11),
        ..PlayerOptions::default()
    }
}

fn player(text: &str, count: usize, shuffle: bool) -> SessionPlayer {
    SessionPlayer::new(images(count), parse(text).unwrap(), seeded(shuffle)).unwrap()
}

fn position(player: &SessionPlayer) -> (usize, usize, u32) {
    let cursor = player.cursor();
    (
        cursor.image_index,
        cursor.segment_index,
        cursor.steps_displayed_in_segment,
    )
}

#[test]
fn parses_the_documented_examples() {
    let spec = parse("2x30sec + 1x5min break").unwrap();
    let triples: Vec<_> = spec
        .segments()
        .iter()
        .map(|s| (s.repeat_count(), s.duration_secs(), s.is_break()))
        .collect();
    assert_eq!(triples, vec![(2, 30, false), (1, 300, true)]);

    let warmup = parse("Warmup: 3x1min").unwrap();
    assert_eq!(warmup.len(), 1);
    assert_eq!(warmup.segments()[0].duration_secs(), 60);

    assert_eq!(parse(""), Err(ScheduleError::EmptySpec));
    assert!(matches!(
        parse("2xbadunit"),
        Err(ScheduleError::MalformedSegment {
            fault: SegmentFault::MissingUnit,
            ..
        })
    ));
}

#[test]
fn serialization_is_a_parse_fixed_point() {
    for text in SCHEDULES {
        let spec = parse(text).unwrap();
        assert_eq!(parse(&serialize(&spec)).unwrap(), spec, "{text}");
    }
}

#[test]
fn active_only_schedules_close_after_one_step_per_image() {
    for text in ["1x30sec", "5x1min", "2x10sec + 3x20sec"] {
        for count in 1..=7 {
            let mut p = player(text, count, false);
            for _ in 0..count {
                assert!(p.skip_forward());
            }
            assert_eq!(p.cursor().image_index, 0, "{text} with {count} images");
        }
    }
}

#[test]
fn every_image_is_shown_once_per_pass_even_with_breaks() {
    for text in SCHEDULES {
        for count in [1usize, 2, 3, 5] {
            let mut p = player(text, count, false);
            let mut shown = Vec::new();
            if let Some(image) = p.current_image() {
                shown.push(image.to_string());
            }

            while shown.len() < count {
                let before = p.cursor().image_index;
                p.skip_forward();
                match p.current_image() {
                    Some(image) => shown.push(image.to_string()),
                    None => assert_eq!(p.cursor().image_index, before, "break consumed an image"),
                }
            }

            assert_eq!(shown, images(count), "{text} with {count} images");
        }
    }
}

#[test]
fn back_then_forward_restores_every_reachable_position() {
    for text in SCHEDULES {
        let mut p = player(text, 4, false);
        for _ in 0..40 {
            let here = position(&p);
            if p.can_go_back() {
                assert!(p.skip_backward());
                assert!(p.skip_forward());
                assert_eq!(position(&p), here, "{text}");
            } else {
                assert!(!p.skip_backward());
                assert_eq!(position(&p), here, "{text}");
            }
            p.skip_forward();
        }
    }
}

#[test]
fn end_twice_stays_ended_and_ignores_ticks() {
    let mut p = player("2x30sec + 1x5min break", 2, false);
    p.start();
    assert!(p.end());
    assert!(!p.end());
    assert_eq!(p.status(), PlayerStatus::Ended);
    assert_eq!(p.tick(), TickOutcome::Ignored);
    assert!(!p.skip_forward());
    assert!(!p.start());
    assert_eq!(p.status(), PlayerStatus::Ended);
}

#[test]
fn shuffled_wrap_keeps_the_image_multiset() {
    for text in SCHEDULES {
        let mut p = player(text, 6, true);
        let mut expected = images(6);
        expected.sort();

        let mut wraps = 0;
        for _ in 0..200 {
            let before = p.cursor().image_index;
            p.skip_forward();
            if before != 0 && p.cursor().image_index == 0 {
                wraps += 1;
                let mut now = p.images().to_vec();
                now.sort();
                assert_eq!(now, expected, "{text}");
            }
        }
        assert!(wraps > 0, "{text} never wrapped");
    }
}
