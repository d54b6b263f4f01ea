mod collections;
mod images;
mod practice_runs;
mod saved_sessions;
