//! Terminal front-end: library management subcommands and an interactive
//! player that stands in for the graphical display layer.

mod play;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::{
    db::CollectionSelector,
    library::commands as library,
    player::{commands as player, format_clock},
    schedule::SegmentDraft,
    AppState,
};

#[derive(Parser, Debug)]
#[command(name = "sketchtimer", version, about = "Timed image practice for figure drawing")]
pub struct Cli {
    /// Library location (overrides SKETCHTIMER_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the image library
    Images {
        #[command(subcommand)]
        action: ImageCommand,
    },
    /// Manage collections of images
    Collections {
        #[command(subcommand)]
        action: CollectionCommand,
    },
    /// Manage saved session schedules
    Sessions {
        #[command(subcommand)]
        action: SessionCommand,
    },
    /// Run the interactive player
    Play {
        #[command(subcommand)]
        mode: PlayCommand,
    },
    /// Show recent practice runs
    History {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// Import image files or directories (one level deep)
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    List,
    Remove { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommand {
    Create { name: String },
    List,
    /// List a collection's images in play order
    Show { id: i64 },
    Rename { id: i64, name: String },
    Delete { id: i64 },
    /// Append images to a collection
    Add {
        id: i64,
        #[arg(required = true)]
        image_ids: Vec<i64>,
    },
    Remove { id: i64, image_id: i64 },
    /// Set the play order; must list every member exactly once
    Reorder {
        id: i64,
        #[arg(required = true)]
        image_ids: Vec<i64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Save a duration text, e.g. "2x30sec + 1x5min break"
    Save { name: String, text: String },
    /// Save a schedule from segment rows
    Build {
        name: String,
        /// count,duration,unit[,break], repeatable
        #[arg(long = "segment", required = true)]
        segments: Vec<SegmentDraft>,
    },
    List,
    Delete { id: i64 },
    /// Parse a duration text and print its normalised form
    Check { text: String },
}

#[derive(Subcommand, Debug)]
pub enum PlayCommand {
    /// Play a saved session id or an inline duration text
    Session {
        target: String,
        /// "all" or a collection id
        #[arg(long)]
        collection: Option<CollectionSelector>,
        #[arg(long)]
        shuffle: bool,
    },
    /// Show every image for the same number of seconds
    Fixed {
        #[arg(long)]
        seconds: Option<u32>,
        #[arg(long)]
        collection: Option<CollectionSelector>,
        #[arg(long)]
        shuffle: bool,
    },
}

pub async fn execute(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Images { action } => images(state, action).await,
        Command::Collections { action } => collections(state, action).await,
        Command::Sessions { action } => sessions(state, action).await,
        Command::Play { mode } => play(state, mode).await,
        Command::History { limit, offset } => history(state, limit, offset).await,
    }
}

async fn images(state: &AppState, action: ImageCommand) -> Result<()> {
    match action {
        ImageCommand::Import { paths } => {
            let report = library::import_images(state, paths).await.map_err(anyhow::Error::msg)?;
            for image in &report.imported {
                println!("+ {:>4}  {}", image.id, image.path);
            }
            for path in &report.duplicates {
                println!("= already imported: {path}");
            }
            for path in &report.skipped {
                println!("- skipped: {path}");
            }
            println!(
                "{} imported, {} duplicates, {} skipped",
                report.imported.len(),
                report.duplicates.len(),
                report.skipped.len()
            );
        }
        ImageCommand::List => {
            let images = library::list_images(state).await.map_err(anyhow::Error::msg)?;
            if images.is_empty() {
                println!("No images imported yet.");
            }
            for image in images {
                println!("{:>4}  {}", image.id, image.path);
            }
        }
        ImageCommand::Remove { id } => {
            library::remove_image(state, id).await.map_err(anyhow::Error::msg)?;
            println!("Removed image {id}");
        }
    }
    Ok(())
}

async fn collections(state: &AppState, action: CollectionCommand) -> Result<()> {
    match action {
        CollectionCommand::Create { name } => {
            let collection = library::create_collection(state, name)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Created collection {} ({})", collection.id, collection.name);
        }
        CollectionCommand::List => {
            let collections = library::list_collections(state).await.map_err(anyhow::Error::msg)?;
            if collections.is_empty() {
                println!("No collections yet.");
            }
            for collection in collections {
                println!(
                    "{:>4}  {}  ({} images)",
                    collection.id, collection.name, collection.image_count
                );
            }
        }
        CollectionCommand::Show { id } => {
            let images = library::collection_images(state, id)
                .await
                .map_err(anyhow::Error::msg)?;
            for (position, image) in images.iter().enumerate() {
                println!("{:>3}. [{}] {}", position + 1, image.id, image.path);
            }
        }
        CollectionCommand::Rename { id, name } => {
            let collection = library::rename_collection(state, id, name)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Renamed collection {} to {}", collection.id, collection.name);
        }
        CollectionCommand::Delete { id } => {
            library::delete_collection(state, id).await.map_err(anyhow::Error::msg)?;
            println!("Deleted collection {id}");
        }
        CollectionCommand::Add { id, image_ids } => {
            let added = library::add_to_collection(state, id, image_ids)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Added {added} images to collection {id}");
        }
        CollectionCommand::Remove { id, image_id } => {
            library::remove_from_collection(state, id, image_id)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Removed image {image_id} from collection {id}");
        }
        CollectionCommand::Reorder { id, image_ids } => {
            library::reorder_collection(state, id, image_ids)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Reordered collection {id}");
        }
    }
    Ok(())
}

async fn sessions(state: &AppState, action: SessionCommand) -> Result<()> {
    match action {
        SessionCommand::Save { name, text } => {
            let saved = library::save_session(state, name, text)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Saved {}  {}", saved.id, saved.display_label());
        }
        SessionCommand::Build { name, segments } => {
            let saved = library::save_session_from_segments(state, name, segments)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Saved {}  {}", saved.id, saved.display_label());
        }
        SessionCommand::List => {
            let sessions = library::list_saved_sessions(state)
                .await
                .map_err(anyhow::Error::msg)?;
            if sessions.is_empty() {
                println!("No saved sessions yet.");
            }
            for saved in sessions {
                println!("{:>4}  {}", saved.id, saved.display_label());
            }
        }
        SessionCommand::Delete { id } => {
            library::delete_saved_session(state, id)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Deleted saved session {id}");
        }
        SessionCommand::Check { text } => {
            let normalised = library::check_duration_text(&text).map_err(anyhow::Error::msg)?;
            println!("{normalised}");
        }
    }
    Ok(())
}

async fn play(state: &AppState, mode: PlayCommand) -> Result<()> {
    let last_used = state.settings.last_used();

    let begun = match mode {
        PlayCommand::Session {
            target,
            collection,
            shuffle,
        } => {
            let selector = collection.unwrap_or(last_used.collection);
            match target.trim().parse::<i64>() {
                Ok(session_id) => {
                    player::begin_saved_session(state, session_id, selector, shuffle).await
                }
                Err(_) => player::begin_session(state, target, selector, shuffle).await,
            }
        }
        PlayCommand::Fixed {
            seconds,
            collection,
            shuffle,
        } => {
            let selector = collection.unwrap_or(last_used.collection);
            player::begin_fixed(state, seconds, selector, shuffle).await
        }
    };

    let snapshot = begun.map_err(anyhow::Error::msg)?;
    play::run_interactive(state, snapshot).await
}

async fn history(state: &AppState, limit: usize, offset: usize) -> Result<()> {
    let runs = player::list_history(state, limit, offset)
        .await
        .map_err(anyhow::Error::msg)?;
    if runs.is_empty() {
        println!("No practice runs recorded.");
        return Ok(());
    }

    for run in runs {
        let active = u32::try_from(run.active_secs)
            .map(format_clock)
            .map_err(|_| anyhow!("run {} has an out-of-range duration", run.id))?;
        println!(
            "{}  {:<11}  {:<7}  {}  images {:>3}  {}  [{}]",
            run.started_at.format("%Y-%m-%d %H:%M"),
            run.status.as_str(),
            run.mode.as_str(),
            active,
            run.images_shown,
            run.duration_text,
            run.source,
        );
    }
    Ok(())
}
