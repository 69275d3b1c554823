//! Command framing.
//!
//! Every request carries the credentials and ten positional parameter
//! slots, unused slots left empty, and is terminated by `\r`:
//!
//! ```text
//! <P><UN>su</UN><Pwd>pass</Pwd><Cmd>IpInfo</Cmd><P1></P1>…<P10></P10></P>\r
//! ```

use std::fmt::Write as _;

/// Number of parameter slots in a command envelope.
pub const PARAM_SLOTS: usize = 10;

/// Command used to open a session.
pub const LOGIN: &str = "Login";

/// Encode `command` with its `params` into a wire-ready request.
///
/// Parameters beyond [`PARAM_SLOTS`] are dropped.
#[must_use]
pub fn encode(username: &str, password: &str, command: &str, params: &[&str]) -> String {
    let mut out = format!("<P><UN>{username}</UN><Pwd>{password}</Pwd><Cmd>{command}</Cmd>");
    for slot in 1..=PARAM_SLOTS {
        let value = params.get(slot - 1).copied().unwrap_or_default();
        let _ = write!(out, "<P{slot}>{value}</P{slot}>");
    }
    out.push_str("</P>\r");
    out
}
