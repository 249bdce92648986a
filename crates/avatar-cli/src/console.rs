//! Operator console: one command per line, applied to a [`PlayerHandle`].

use avatar_player::PlayerHandle;

use crate::error::CliError;

pub const HELP: &str = "\
Commands:
  play <clip>   queue a clip (file name in the clip directory, or a path)
  now <clip>    interrupt the current clip and play this one next
  all           queue every clip in the directory
  pause         pause the current clip
  resume        resume playback
  skip          stop the current clip early (it is kept on disk)
  list          list clips in the directory
  status        show the engine status
  enable        resume picking up clips
  disable       stop picking up clips
  help          show this help
  quit          stop the player and exit";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Play(String),
    Now(String),
    All,
    Pause,
    Resume,
    Skip,
    List,
    Status,
    Enable(bool),
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CliError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(word, rest)| (word, rest.trim()));

        let clip_arg = |cmd: &str| {
            if rest.is_empty() {
                Err(CliError::Arguments(format!("'{cmd}' needs a clip name")))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "play" | "p" => Self::Play(clip_arg("play")?),
            "now" => Self::Now(clip_arg("now")?),
            "all" => Self::All,
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "skip" | "abort" => Self::Skip,
            "list" | "ls" => Self::List,
            "status" => Self::Status,
            "enable" => Self::Enable(true),
            "disable" => Self::Enable(false),
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => {
                return Err(CliError::Arguments(format!(
                    "unknown command '{other}' (try 'help')"
                )));
            }
        };
        Ok(Some(command))
    }
}

/// What the console should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Apply a command to the player, returning the text to show the operator.
pub fn apply(command: &ConsoleCommand, handle: &PlayerHandle) -> Result<(Flow, String), CliError> {
    let reply = match command {
        ConsoleCommand::Play(name) => {
            let clip = handle.enqueue(name)?;
            format!("queued {}", clip.name())
        }
        ConsoleCommand::Now(name) => {
            let clip = handle.play_now(name)?;
            format!("playing {} next", clip.name())
        }
        ConsoleCommand::All => {
            handle.enqueue_all()?;
            "queued all clips".to_string()
        }
        ConsoleCommand::Pause => idle_or(handle.pause(), "paused"),
        ConsoleCommand::Resume => {
            handle.resume();
            "resumed".to_string()
        }
        ConsoleCommand::Skip => idle_or(handle.abort_current(), "skipped"),
        ConsoleCommand::List => {
            let clips = handle.known_clips()?;
            if clips.is_empty() {
                "no clips".to_string()
            } else {
                clips.join("\n")
            }
        }
        ConsoleCommand::Status => serde_json::to_string_pretty(&handle.status())
            .map_err(|e| CliError::Player(e.to_string()))?,
        ConsoleCommand::Enable(enabled) => {
            handle.set_enabled(*enabled)?;
            let state = if *enabled { "enabled" } else { "disabled" };
            state.to_string()
        }
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Quit => return Ok((Flow::Quit, "stopping".to_string())),
    };
    Ok((Flow::Continue, reply))
}

fn idle_or(acted: bool, done: &str) -> String {
    let reply = if acted { done } else { "nothing is playing" };
    reply.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_clip_names() {
        assert_eq!(
            ConsoleCommand::parse("play reply 01.wav").unwrap(),
            Some(ConsoleCommand::Play("reply 01.wav".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("  NOW  urgent.wav ").unwrap(),
            Some(ConsoleCommand::Now("urgent.wav".into()))
        );
    }

    #[test]
    fn parses_bare_commands_and_aliases() {
        assert_eq!(ConsoleCommand::parse("all").unwrap(), Some(ConsoleCommand::All));
        assert_eq!(ConsoleCommand::parse("skip").unwrap(), Some(ConsoleCommand::Skip));
        assert_eq!(ConsoleCommand::parse("abort").unwrap(), Some(ConsoleCommand::Skip));
        assert_eq!(ConsoleCommand::parse("q").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(
            ConsoleCommand::parse("disable").unwrap(),
            Some(ConsoleCommand::Enable(false))
        );
    }

    #[test]
    fn blank_line_is_nothing() {
        assert_eq!(ConsoleCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn rejects_unknown_and_incomplete_commands() {
        assert!(matches!(
            ConsoleCommand::parse("dance"),
            Err(CliError::Arguments(_))
        ));
        assert!(matches!(
            ConsoleCommand::parse("play"),
            Err(CliError::Arguments(_))
        ));
    }
}
