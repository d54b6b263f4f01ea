use std::io::Write;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use crate::{
    log_debug, log_warn,
    player::{commands as player, format_clock, Frame, PlayerEvent, PlayerSnapshot},
    AppState,
};

const ENABLE_LOGS: bool = false;

const HELP: &str = "keys: [s]tart  [p]ause  [r]eset  [n]ext  [b]ack  [t]oggle shuffle  [e]nd";

fn describe(snapshot: &PlayerSnapshot) -> String {
    let frame = match &snapshot.frame {
        Frame::Image { path, index, total } => format!("image {}/{}  {}", index + 1, total, path),
        Frame::Break => "break".to_string(),
    };
    let cue = if snapshot.cue_active { " *" } else { "" };
    format!(
        "{:?}  {}{}  segment {}/{}  {}",
        snapshot.status,
        snapshot.clock,
        cue,
        snapshot.segment_index + 1,
        snapshot.segment_count,
        frame
    )
}

fn print_line(line: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.flush();
}

/// Drive the active player from single-letter stdin commands until the
/// user ends it or stdin closes.
pub async fn run_interactive(state: &AppState, initial: PlayerSnapshot) -> Result<()> {
    let mut events = state.player.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(PlayerEvent::Tick(snapshot)) => print_line(&format!("  {}", describe(&snapshot))),
                Ok(PlayerEvent::StateChanged(snapshot)) => print_line(&describe(&snapshot)),
                Ok(PlayerEvent::Ended(_)) | Err(RecvError::Closed) => break,
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("Display fell behind by {skipped} events");
                }
            }
        }
    });

    print_line(HELP);
    print_line(&describe(&initial));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let key = line.trim().to_ascii_lowercase();
        log_debug!("player key {key:?}");

        let outcome = match key.as_str() {
            "s" => player::start_player(state).await,
            "p" => player::pause_player(state).await,
            "r" => player::reset_timer(state).await,
            "n" => player::skip_forward(state).await,
            "b" => player::skip_backward(state).await,
            "t" => {
                let enabled = state
                    .player
                    .snapshot()
                    .await
                    .map(|snapshot| !snapshot.shuffle)
                    .unwrap_or(true);
                player::set_shuffle(state, enabled).await
            }
            "e" | "q" => break,
            "" => continue,
            _ => {
                print_line(HELP);
                continue;
            }
        };

        if let Err(err) = outcome {
            print_line(&format!("error: {err}"));
        }
    }

    let ended = player::end_player(state).await;
    printer.abort();

    let snapshot = ended.map_err(anyhow::Error::msg)?;
    print_line(&format!(
        "Ended after {}, {} images shown",
        format_clock(u32::try_from(snapshot.elapsed_secs).unwrap_or(u32::MAX)),
        snapshot.images_shown
    ));
    Ok(())
}
