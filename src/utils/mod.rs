//! Utility functions.
//!
//! Small helpers shared across plugins and event handlers.

/// Current time as ms since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// User part of a JID: `"12345@s.whatsapp.net"` -> `"12345"`.
pub fn jid_user(jid: &str) -> &str {
    jid.split('@').next().unwrap_or(jid)
}

/// Render a JID as a WhatsApp mention token (`@12345`). The mention only
/// highlights when the JID is also listed in the message's mentions.
pub fn mention(jid: &str) -> String {
    format!("@{}", jid_user(jid))
}

/// Parse an `on`/`off` style toggle argument.
pub fn parse_toggle(arg: &str) -> Option<bool> {
    match arg.to_lowercase().as_str() {
        "on" | "enable" | "1" => Some(true),
        "off" | "disable" | "0" => Some(false),
        _ => None,
    }
}

/// Human-readable duration, largest two units.
pub fn format_duration(secs: u64) -> String {
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (mins, secs) = (rem / 60, rem % 60);

    let parts: Vec<String> = [
        (days, "d"),
        (hours, "h"),
        (mins, "m"),
        (secs, "s"),
    ]
    .iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, unit)| format!("{n}{unit}"))
    .take(2)
    .collect();

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
