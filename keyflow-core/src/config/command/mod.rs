mod bound;

use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ActionError, KeyflowError};
use crate::launcher::Invocation;

pub use self::bound::BoundAction;

/// Something a hotkey can trigger.
///
/// Implementations must be cheap to call from the hook thread: anything slow
/// should be handed off (the built-in commands only spawn a process).
pub trait Action: Debug + Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the effect could not be carried out.
    fn execute(&self) -> Result<(), ActionError>;

    /// Display name, used for notifications.
    fn name(&self) -> &str;

    fn category(&self) -> Category;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Volume,
    Media,
    Display,
    Custom,
}

impl Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Volume => "volume",
            Self::Media => "media",
            Self::Display => "display",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// The built-in actions a shortcut can be configured with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    VolumeUp,
    VolumeDown,
    VolumeMute,
    BrightnessUp,
    BrightnessDown,
    MediaPlayPause,
    MediaNext,
    MediaPrevious,
    Execute(String),
}

impl Command {
    pub const BUILTINS: [Command; 8] = [
        Self::VolumeUp,
        Self::VolumeDown,
        Self::VolumeMute,
        Self::BrightnessUp,
        Self::BrightnessDown,
        Self::MediaPlayPause,
        Self::MediaNext,
        Self::MediaPrevious,
    ];

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::VolumeUp => "Volume Up",
            Self::VolumeDown => "Volume Down",
            Self::VolumeMute => "Volume Mute",
            Self::BrightnessUp => "Brightness Up",
            Self::BrightnessDown => "Brightness Down",
            Self::MediaPlayPause => "Play/Pause",
            Self::MediaNext => "Next Track",
            Self::MediaPrevious => "Previous Track",
            Self::Execute(shell_command) => shell_command,
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::VolumeUp | Self::VolumeDown | Self::VolumeMute => Category::Volume,
            Self::BrightnessUp | Self::BrightnessDown => Category::Display,
            Self::MediaPlayPause | Self::MediaNext | Self::MediaPrevious => Category::Media,
            Self::Execute(_) => Category::Custom,
        }
    }

    /// The external program that realises this command.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        match self {
            Self::VolumeUp => Invocation::new("pactl", ["set-sink-volume", "@DEFAULT_SINK@", "+5%"]),
            Self::VolumeDown => {
                Invocation::new("pactl", ["set-sink-volume", "@DEFAULT_SINK@", "-5%"])
            }
            Self::VolumeMute => Invocation::new("pactl", ["set-sink-mute", "@DEFAULT_SINK@", "toggle"]),
            Self::BrightnessUp => Invocation::new("brightnessctl", ["set", "+10%"]),
            Self::BrightnessDown => Invocation::new("brightnessctl", ["set", "10%-"]),
            Self::MediaPlayPause => Invocation::new("playerctl", ["play-pause"]),
            Self::MediaNext => Invocation::new("playerctl", ["next"]),
            Self::MediaPrevious => Invocation::new("playerctl", ["previous"]),
            Self::Execute(shell_command) => Invocation::new("sh", ["-c", shell_command.as_str()]),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execute(shell_command) => write!(f, "Execute({shell_command})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Accepts `VOLUME_UP`, `volume-up`, `VolumeUp` and `Execute <shell command>`.
impl FromStr for Command {
    type Err = KeyflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(shell_command) = without_head(trimmed, "execute") {
            let shell_command = shell_command.trim();
            if shell_command.is_empty() {
                return Err(KeyflowError::UnknownCommand(s.to_owned()));
            }
            return Ok(Self::Execute(shell_command.to_owned()));
        }

        let folded: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        Self::BUILTINS
            .into_iter()
            .find(|command| format!("{command:?}").to_ascii_lowercase() == folded)
            .ok_or_else(|| KeyflowError::UnknownCommand(s.to_owned()))
    }
}

fn without_head<'a>(s: &'a str, head: &str) -> Option<&'a str> {
    let prefix = s.get(..head.len())?;
    if !prefix.eq_ignore_ascii_case(head) {
        return None;
    }
    let rest = &s[head.len()..];
    rest.starts_with(char::is_whitespace).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::{Category, Command};

    #[test]
    fn parse_accepts_many_spellings() {
        assert_eq!("VOLUME_UP".parse::<Command>().unwrap(), Command::VolumeUp);
        assert_eq!("volume-down".parse::<Command>().unwrap(), Command::VolumeDown);
        assert_eq!("MediaPlayPause".parse::<Command>().unwrap(), Command::MediaPlayPause);
        assert_eq!(" brightness up ".parse::<Command>().unwrap(), Command::BrightnessUp);
    }

    #[test]
    fn parse_execute_keeps_shell_command() {
        assert_eq!(
            "Execute notify-send hi".parse::<Command>().unwrap(),
            Command::Execute("notify-send hi".to_owned())
        );
        assert!("Execute   ".parse::<Command>().is_err());
        assert!("Executes".parse::<Command>().is_err());
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("Teleport".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn names_and_categories() {
        assert_eq!(Command::VolumeUp.display_name(), "Volume Up");
        assert_eq!(Command::VolumeUp.category(), Category::Volume);
        assert_eq!(Command::BrightnessDown.category(), Category::Display);
        assert_eq!(Command::MediaNext.category(), Category::Media);
        assert_eq!(Command::Execute("st".to_owned()).display_name(), "st");
    }

    #[test]
    fn execute_runs_through_shell() {
        let invocation = Command::Execute("echo hi".to_owned()).invocation();
        assert_eq!(invocation.program, "sh");
        assert_eq!(invocation.args, vec!["-c".to_owned(), "echo hi".to_owned()]);
    }
}
