//! Decoder for the VIA unsolicited status protocol.
//!
//! Pure functions operating on one line of text, no IO. Lines are
//! terminated by a carriage return on the wire and split into
//! `|`-separated fields. The first field is the record tag:
//!
//! | Tag | Shape | Outcome |
//! |-----|-------|---------|
//! | `PList` | `PList\|…\|cnt\|<n>` | `current-user-count`, state `n - 1` |
//! | `PList` | `PList\|<user>\|1` / `0` | `user-login-logout`, `login` / `logout` |
//! | `MediaStatus` | `MediaStatus\|…\|1` / `0` | `media-status`, `media-started` / `media-stopped` |
//! | `DisplayStatus` | `DisplayStatus\|…\|<user>\|1` / `0` | `presenting`, `presentation-started` / `presentation-stopped` |
//!
//! Anything else (command echoes, keepalive replies) is ignored.
//!
//! The user count reported by the panel includes the monitoring session
//! itself, so one is subtracted. A reported count of zero therefore yields
//! `-1`; the value is passed through unclamped.

use crate::event::{Action, EventKind, EventRecord};

/// Byte that terminates a line on the wire.
pub const LINE_DELIMITER: u8 = b'\r';

/// Separator between fields of a line.
pub const FIELD_SEPARATOR: char = '|';

const TAG_USER_LIST: &str = "PList";
const TAG_MEDIA_STATUS: &str = "MediaStatus";
const TAG_DISPLAY_STATUS: &str = "DisplayStatus";
const COUNT_MARKER: &str = "cnt";

/// Result of decoding one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The line maps to an event.
    Record(EventRecord),
    /// The line produces nothing.
    Ignored(Ignored),
}

/// Why a line produced no event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Ignored {
    /// Blank line (e.g. a stray `\n` between records).
    #[error("empty line")]
    Empty,

    /// Tag not handled by the monitor; the normal case for most traffic.
    #[error("unrecognised record {tag:?}")]
    Unrecognised { tag: String },

    /// A known tag with fewer fields than its shape requires.
    #[error("{tag} record needs {expected} fields, got {actual}")]
    Malformed {
        tag: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The user count is not an integer, or cannot be decremented.
    #[error("user count {value:?} is not a valid count")]
    InvalidCount { value: String },

    /// A status flag other than `0` or `1`.
    #[error("{tag} flag {value:?} is neither 0 nor 1")]
    UnknownFlag { tag: &'static str, value: String },
}

impl Ignored {
    /// Whether the line points at a protocol anomaly worth a warning, as
    /// opposed to ordinary traffic the monitor does not care about.
    #[must_use]
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Self::Empty | Self::Unrecognised { .. })
    }
}

/// Decode one raw line (delimiter and surrounding whitespace allowed).
#[must_use]
pub fn decode(line: &str) -> Decoded {
    let line = line.trim();
    if line.is_empty() {
        return Decoded::Ignored(Ignored::Empty);
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    let result = match fields[0] {
        TAG_USER_LIST => decode_user_list(&fields),
        TAG_MEDIA_STATUS => decode_media_status(&fields),
        TAG_DISPLAY_STATUS => decode_display_status(&fields),
        other => Err(Ignored::Unrecognised {
            tag: other.to_string(),
        }),
    };

    match result {
        Ok(record) => Decoded::Record(record),
        Err(reason) => Decoded::Ignored(reason),
    }
}

/// Decode raw bytes, replacing invalid UTF-8.
#[must_use]
pub fn decode_bytes(line: &[u8]) -> Decoded {
    decode(&String::from_utf8_lossy(line))
}

fn require(fields: &[&str], tag: &'static str, expected: usize) -> Result<(), Ignored> {
    if fields.len() < expected {
        return Err(Ignored::Malformed {
            tag,
            expected,
            actual: fields.len(),
        });
    }
    Ok(())
}

fn flag(tag: &'static str, value: &str) -> Result<bool, Ignored> {
    match value.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(Ignored::UnknownFlag {
            tag,
            value: other.to_string(),
        }),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn decode_user_list(fields: &[&str]) -> Result<EventRecord, Ignored> {
    require(fields, TAG_USER_LIST, 3)?;

    // The count marker has been seen in both the second and third field.
    if fields[1] == COUNT_MARKER || fields[2] == COUNT_MARKER {
        require(fields, TAG_USER_LIST, 4)?;
        let raw = fields[3].trim();
        let invalid = || Ignored::InvalidCount {
            value: raw.to_string(),
        };
        let count = raw
            .parse::<i64>()
            .ok()
            .and_then(|count| count.checked_sub(1))
            .ok_or_else(invalid)?;
        return Ok(EventRecord {
            kind: EventKind::CurrentUserCount,
            action: Action::LoginCount,
            user: None,
            state: count.to_string(),
        });
    }

    let action = if flag(TAG_USER_LIST, fields[2])? {
        Action::Login
    } else {
        Action::Logout
    };
    Ok(EventRecord {
        kind: EventKind::UserLoginLogout,
        action,
        user: non_empty(fields[1]),
        state: action.as_str().to_string(),
    })
}

fn decode_media_status(fields: &[&str]) -> Result<EventRecord, Ignored> {
    require(fields, TAG_MEDIA_STATUS, 3)?;

    let action = if flag(TAG_MEDIA_STATUS, fields[2])? {
        Action::MediaStarted
    } else {
        Action::MediaStopped
    };
    Ok(EventRecord {
        kind: EventKind::MediaStatus,
        action,
        user: None,
        state: action.as_str().to_string(),
    })
}

fn decode_display_status(fields: &[&str]) -> Result<EventRecord, Ignored> {
    require(fields, TAG_DISPLAY_STATUS, 4)?;

    let action = if flag(TAG_DISPLAY_STATUS, fields[3])? {
        Action::PresentationStarted
    } else {
        Action::PresentationStopped
    };
    Ok(EventRecord {
        kind: EventKind::Presenting,
        action,
        user: non_empty(fields[2]),
        state: action.as_str().to_string(),
    })
}
