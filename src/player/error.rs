use crate::schedule::ScheduleError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("no images to display; the schedule has active segments")]
    NoImages,

    #[error("fixed interval must be at least one second")]
    InvalidInterval,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}
