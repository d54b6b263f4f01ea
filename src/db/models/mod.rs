pub mod collection;
pub mod image;
pub mod practice_run;
pub mod saved_session;

pub use collection::{Collection, CollectionSelector};
pub use image::{ImageRecord, ImportReport};
pub use practice_run::{PracticeRun, RunStatus};
pub use saved_session::SavedSession;
