use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::schedule::{SessionDurationSpec, TimingSegment};

use super::PlayerError;

pub const DEFAULT_CUE_THRESHOLD_SECS: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlayerMode {
    Fixed,
    #[default]
    Session,
}

impl PlayerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerMode::Fixed => "Fixed",
            PlayerMode::Session => "Session",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCursor {
    pub image_index: usize,
    pub segment_index: usize,
    pub steps_displayed_in_segment: u32,
    pub remaining_secs: u32,
    pub running: bool,
}

/// What the display layer should be showing right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Frame {
    Image {
        path: String,
        index: usize,
        total: usize,
    },
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed.
    Ignored,
    Counted,
    /// The countdown hit zero and the schedule moved to the next step.
    Advanced,
}

#[derive(Debug, Clone)]
pub struct PlayerOptions {
    pub shuffle: bool,
    pub cue_threshold_secs: u32,
    pub seed: Option<u64>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            shuffle: false,
            cue_threshold_secs: DEFAULT_CUE_THRESHOLD_SECS,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    pub mode: PlayerMode,
    pub frame: Frame,
    pub remaining_secs: u32,
    pub clock: String,
    pub segment_index: usize,
    pub segment_count: usize,
    pub steps_in_segment: u32,
    pub can_go_back: bool,
    pub shuffle: bool,
    pub cue_active: bool,
    pub elapsed_secs: u64,
    pub images_shown: u64,
}

/// Countdown state machine that walks an image list through a cyclic
/// schedule of active and break segments.
#[derive(Debug)]
pub struct SessionPlayer {
    images: Vec<String>,
    spec: SessionDurationSpec,
    mode: PlayerMode,
    shuffle: bool,
    cue_threshold_secs: u32,
    status: PlayerStatus,
    cursor: PlaybackCursor,
    /// Steps taken since the session began, breaks included.
    steps_taken: u64,
    /// Step at which the current pass over the image list began.
    pass_start: u64,
    /// Set while leading break steps have not yet revealed the first image.
    first_image_pending: bool,
    elapsed_secs: u64,
    images_shown: u64,
    rng: StdRng,
}

impl SessionPlayer {
    pub fn new(
        images: Vec<String>,
        spec: SessionDurationSpec,
        options: PlayerOptions,
    ) -> Result<Self, PlayerError> {
        if images.is_empty() && spec.has_active_segment() {
            return Err(PlayerError::NoImages);
        }

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut images = images;
        if options.shuffle {
            images.shuffle(&mut rng);
        }

        let first = *spec.segment(0);
        let first_image_pending = first.is_break();

        Ok(Self {
            images,
            spec,
            mode: PlayerMode::Session,
            shuffle: options.shuffle,
            cue_threshold_secs: options.cue_threshold_secs,
            status: PlayerStatus::Idle,
            cursor: PlaybackCursor {
                image_index: 0,
                segment_index: 0,
                steps_displayed_in_segment: 0,
                remaining_secs: first.duration_secs(),
                running: false,
            },
            steps_taken: 0,
            pass_start: 0,
            first_image_pending,
            elapsed_secs: 0,
            images_shown: if first_image_pending { 0 } else { 1 },
            rng,
        })
    }

    /// Every image shown for the same `interval_secs`, no breaks.
    pub fn fixed_interval(
        images: Vec<String>,
        interval_secs: u32,
        options: PlayerOptions,
    ) -> Result<Self, PlayerError> {
        if interval_secs == 0 {
            return Err(PlayerError::InvalidInterval);
        }
        if images.is_empty() {
            return Err(PlayerError::NoImages);
        }

        let spec = SessionDurationSpec::fixed_interval(images.len(), interval_secs)
            .map_err(|_| PlayerError::InvalidInterval)?;
        let mut player = Self::new(images, spec, options)?;
        player.mode = PlayerMode::Fixed;
        Ok(player)
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn spec(&self) -> &SessionDurationSpec {
        &self.spec
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn images_shown(&self) -> u64 {
        self.images_shown
    }

    pub fn is_ended(&self) -> bool {
        self.status == PlayerStatus::Ended
    }

    pub fn current_segment(&self) -> &TimingSegment {
        self.spec.segment(self.cursor.segment_index)
    }

    pub fn current_image(&self) -> Option<&str> {
        if self.current_segment().is_break() {
            return None;
        }
        self.images.get(self.cursor.image_index).map(String::as_str)
    }

    pub fn frame(&self) -> Frame {
        match self.current_image() {
            Some(path) => Frame::Image {
                path: path.to_string(),
                index: self.cursor.image_index,
                total: self.images.len(),
            },
            None => Frame::Break,
        }
    }

    /// False at the step where the current pass over the images began.
    pub fn can_go_back(&self) -> bool {
        self.steps_taken > self.pass_start
    }

    pub fn start(&mut self) -> bool {
        match self.status {
            PlayerStatus::Idle | PlayerStatus::Paused => {
                self.status = PlayerStatus::Running;
                self.cursor.running = true;
                true
            }
            PlayerStatus::Running | PlayerStatus::Ended => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status != PlayerStatus::Running {
            return false;
        }
        self.status = PlayerStatus::Paused;
        self.cursor.running = false;
        true
    }

    /// Idempotent; returns whether this call ended the session.
    pub fn end(&mut self) -> bool {
        let changed = self.status != PlayerStatus::Ended;
        self.status = PlayerStatus::Ended;
        self.cursor.running = false;
        changed
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.status != PlayerStatus::Running {
            return TickOutcome::Ignored;
        }

        self.elapsed_secs += 1;
        self.cursor.remaining_secs = self.cursor.remaining_secs.saturating_sub(1);
        if self.cursor.remaining_secs > 0 {
            return TickOutcome::Counted;
        }

        self.advance_step();
        TickOutcome::Advanced
    }

    pub fn reset_current_timer(&mut self) -> bool {
        if self.is_ended() {
            return false;
        }
        self.cursor.remaining_secs = self.current_segment().duration_secs();
        true
    }

    pub fn skip_forward(&mut self) -> bool {
        if self.is_ended() {
            return false;
        }
        self.advance_step();
        true
    }

    pub fn skip_backward(&mut self) -> bool {
        if self.is_ended() || !self.can_go_back() {
            return false;
        }
        self.retreat_step();
        true
    }

    /// Only affects reshuffling at the next wrap-around.
    pub fn set_shuffle(&mut self, enabled: bool) -> bool {
        let changed = self.shuffle != enabled;
        self.shuffle = enabled;
        changed
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let remaining = self.cursor.remaining_secs;
        PlayerSnapshot {
            status: self.status,
            mode: self.mode,
            frame: self.frame(),
            remaining_secs: remaining,
            clock: format_clock(remaining),
            segment_index: self.cursor.segment_index,
            segment_count: self.spec.len(),
            steps_in_segment: self.cursor.steps_displayed_in_segment,
            can_go_back: !self.is_ended() && self.can_go_back(),
            shuffle: self.shuffle,
            cue_active: self.cursor.running
                && self.cue_threshold_secs > 0
                && remaining <= self.cue_threshold_secs,
            elapsed_secs: self.elapsed_secs,
            images_shown: self.images_shown,
        }
    }

    fn advance_step(&mut self) {
        self.cursor.steps_displayed_in_segment += 1;
        if self.cursor.steps_displayed_in_segment >= self.current_segment().repeat_count() {
            self.cursor.segment_index = (self.cursor.segment_index + 1) % self.spec.len();
            self.cursor.steps_displayed_in_segment = 0;
        }
        self.steps_taken += 1;

        if !self.current_segment().is_break() {
            if self.first_image_pending {
                self.first_image_pending = false;
            } else if self.cursor.image_index + 1 >= self.images.len() {
                self.cursor.image_index = 0;
                self.pass_start = self.steps_taken;
                if self.shuffle {
                    self.images.shuffle(&mut self.rng);
                }
            } else {
                self.cursor.image_index += 1;
            }
            self.images_shown += 1;
        }

        self.cursor.remaining_secs = self.current_segment().duration_secs();
    }

    // Segment position is a function of the step count, so it is replayed
    // rather than unwound. The image pointer only moved on active steps.
    fn retreat_step(&mut self) {
        if !self.current_segment().is_break() {
            if self.cursor.image_index > 0 {
                self.cursor.image_index -= 1;
            } else {
                self.first_image_pending = true;
            }
        }

        self.steps_taken -= 1;
        let position = self.spec.position_at(self.steps_taken);
        self.cursor.segment_index = position.segment_index;
        self.cursor.steps_displayed_in_segment = position.steps_in_segment;
        self.cursor.remaining_secs = self.current_segment().duration_secs();
    }
}

/// `MM:SS`, minutes unbounded.
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
