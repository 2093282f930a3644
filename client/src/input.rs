//! Line-oriented commands typed into the client

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Move { x: f32, y: f32 },
    SetSong { area_id: String, song: Option<String> },
    SetVideo { area_id: String, video: Option<String> },
    Seek { area_id: String, elapsed_time_sec: f64 },
    Play { area_id: String },
    Pause { area_id: String },
    Who,
    Areas,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a valid playback position")]
    InvalidPosition(String),

    #[error("no area named '{0}'")]
    UnknownArea(String),

    #[error("area '{area_id}' is not a {expected}")]
    WrongKind {
        area_id: String,
        expected: &'static str,
    },
}

pub const HELP: &str = "\
move <x> <y>           walk to a position
song <area> [ref]      choose a song (omit ref to clear it)
video <area> [url]     choose a video (omit url to clear it)
seek <area> <secs>     jump to a playback position
play <area>            resume playback
pause <area>           pause playback
who                    list players
areas                  list areas
quit                   leave the town";

fn number<T: std::str::FromStr>(word: &str) -> Result<T, CommandError> {
    word.parse()
        .map_err(|_| CommandError::NotANumber(word.to_string()))
}

fn position(word: &str) -> Result<f64, CommandError> {
    let secs: f64 = number(word)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(CommandError::InvalidPosition(word.to_string()));
    }
    Ok(secs)
}

/// Parses one input line; blank lines yield `Ok(None)`
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb, rest.as_slice()) {
        ("move", [x, y]) => Command::Move {
            x: number(x)?,
            y: number(y)?,
        },
        ("move", _) => return Err(CommandError::Usage("move <x> <y>")),

        ("song", [area_id, song @ ..]) => Command::SetSong {
            area_id: area_id.to_string(),
            song: (!song.is_empty()).then(|| song.join(" ")),
        },
        ("song", _) => return Err(CommandError::Usage("song <area> [ref]")),

        ("video", [area_id]) => Command::SetVideo {
            area_id: area_id.to_string(),
            video: None,
        },
        ("video", [area_id, video]) => Command::SetVideo {
            area_id: area_id.to_string(),
            video: Some(video.to_string()),
        },
        ("video", _) => return Err(CommandError::Usage("video <area> [url]")),

        ("seek", [area_id, secs]) => Command::Seek {
            area_id: area_id.to_string(),
            elapsed_time_sec: position(secs)?,
        },
        ("seek", _) => return Err(CommandError::Usage("seek <area> <secs>")),

        ("play", [area_id]) => Command::Play {
            area_id: area_id.to_string(),
        },
        ("play", _) => return Err(CommandError::Usage("play <area>")),

        ("pause", [area_id]) => Command::Pause {
            area_id: area_id.to_string(),
        },
        ("pause", _) => return Err(CommandError::Usage("pause <area>")),

        ("who", []) => Command::Who,
        ("areas", []) => Command::Areas,
        ("help", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,

        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}
