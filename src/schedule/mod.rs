pub mod draft;
pub mod error;
pub mod parser;
pub mod segment;

pub use draft::{build, SegmentDraft, SegmentKind, TimeUnit};
pub use error::{ScheduleError, SegmentFault};
pub use parser::{parse, serialize};
pub use segment::{SchedulePosition, SessionDurationSpec, TimingSegment};
