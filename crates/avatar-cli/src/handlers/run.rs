//! Run command handler: the player plus an operator console.

use anyhow::Result;
use avatar_player::{AudioPlayer, PlaybackOutcome, PlayerConfig, PlayerEvent, PlayerHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::console::{self, ConsoleCommand, Flow};
use crate::error::CliError;

/// Options for the run command.
pub struct RunArgs {
    pub play: Vec<String>,
    pub all: bool,
    pub headless: bool,
}

/// Start the player and serve console commands until `quit`, end of
/// input, or Ctrl+C. The clip playing at that moment is allowed to finish.
pub async fn execute(config: PlayerConfig, args: RunArgs) -> Result<()> {
    let (player, events) = AudioPlayer::start(config).map_err(CliError::from)?;
    let handle = player.handle();

    if let Some(reason) = handle.disabled_reason() {
        eprintln!("Player is disabled: {reason}");
    }
    println!("Watching {} for clips", handle.clip_dir().display());

    for name in &args.play {
        match handle.enqueue(name) {
            Ok(clip) => println!("queued {}", clip.name()),
            Err(e) => eprintln!("{}", CliError::from(e)),
        }
    }
    if args.all {
        handle.enqueue_all().map_err(CliError::from)?;
    }

    let printer = tokio::spawn(print_events(events));

    if args.headless {
        tokio::signal::ctrl_c().await?;
    } else {
        println!("Type 'help' for commands.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if run_line(&line, &handle) == Flow::Quit {
                        break;
                    }
                }
            }
        }
    }

    println!("Stopping; the current clip will finish first.");
    player.shutdown().await.map_err(CliError::from)?;
    printer.await?;
    Ok(())
}

fn run_line(line: &str, handle: &PlayerHandle) -> Flow {
    let command = match ConsoleCommand::parse(line) {
        Ok(Some(command)) => {
            tracing::debug!(?command, "Console command");
            command
        }
        Ok(None) => return Flow::Continue,
        Err(e) => {
            eprintln!("{e}");
            return Flow::Continue;
        }
    };
    match console::apply(&command, handle) {
        Ok((flow, reply)) => {
            println!("{reply}");
            flow
        }
        Err(e) => {
            eprintln!("{e}");
            Flow::Continue
        }
    }
}

async fn print_events(mut events: UnboundedReceiver<PlayerEvent>) {
    while let Some(event) = events.recv().await {
        if let Some(line) = describe(&event) {
            println!("{line}");
        }
    }
}

/// One-line description of an engine event for the operator.
fn describe(event: &PlayerEvent) -> Option<String> {
    let line = match event {
        PlayerEvent::ClipQueued(clip) => format!("+ {}", clip.name()),
        PlayerEvent::ClipStarted(clip) => format!("> {}", clip.name()),
        PlayerEvent::ClipFinished { clip, outcome } => match outcome {
            PlaybackOutcome::Completed { .. } => return None,
            PlaybackOutcome::Aborted { .. } => format!("x {} (skipped)", clip.name()),
            PlaybackOutcome::Failed { reason } => format!("! {}: {reason}", clip.name()),
        },
        PlayerEvent::ClipDeleted(clip) => format!("- {}", clip.name()),
        PlayerEvent::DeleteAbandoned { clip, attempts } => {
            format!("! {} could not be deleted after {attempts} attempts", clip.name())
        }
        PlayerEvent::ClipMissing(clip) => format!("? {} disappeared", clip.name()),
        PlayerEvent::Stopped => "player stopped".to_string(),
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use avatar_player::ClipPath;

    use super::*;

    fn clip() -> ClipPath {
        ClipPath::resolve(Path::new("/clips"), "reply.wav")
    }

    #[test]
    fn completed_playback_is_silent() {
        let event = PlayerEvent::ClipFinished {
            clip: clip(),
            outcome: PlaybackOutcome::Completed { chunks: 4 },
        };
        assert_eq!(describe(&event), None);
    }

    #[test]
    fn describes_failures_with_reason() {
        let event = PlayerEvent::ClipFinished {
            clip: clip(),
            outcome: PlaybackOutcome::Failed {
                reason: "device busy".into(),
            },
        };
        assert_eq!(describe(&event).unwrap(), "! reply.wav: device busy");
        assert_eq!(
            describe(&PlayerEvent::DeleteAbandoned {
                clip: clip(),
                attempts: 3
            })
            .unwrap(),
            "! reply.wav could not be deleted after 3 attempts"
        );
    }
}
