use reqwest::StatusCode;

/// Status used when the transport produced no response at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 599;

/// Fallback text for codes nobody has a name for.
pub const UNKNOWN_STATUS_TEXT: &str = "Unknown Status";

// Non-standard codes seen in the wild (nginx, Cloudflare, proxies).
const EXTENDED: &[(u16, &str)] = &[
    (419, "Page Expired"),
    (420, "Enhance Your Calm"),
    (440, "Login Time-out"),
    (444, "No Response"),
    (449, "Retry With"),
    (450, "Blocked by Windows Parental Controls"),
    (460, "Client Closed Connection"),
    (494, "Request Header Too Large"),
    (495, "SSL Certificate Error"),
    (496, "SSL Certificate Required"),
    (497, "HTTP Request Sent to HTTPS Port"),
    (498, "Invalid Token"),
    (499, "Client Closed Request"),
    (509, "Bandwidth Limit Exceeded"),
    (520, "Web Server Returned an Unknown Error"),
    (521, "Web Server Is Down"),
    (522, "Connection Timed Out"),
    (523, "Origin Is Unreachable"),
    (524, "A Timeout Occurred"),
    (525, "SSL Handshake Failed"),
    (526, "Invalid SSL Certificate"),
    (530, "Site Frozen"),
    (598, "Network Read Timeout Error"),
    (599, "Network Connect Timeout Error"),
];

/// Returns the human-readable text for an HTTP status code.
///
/// Unknown or out-of-range codes resolve to [`UNKNOWN_STATUS_TEXT`].
pub fn status_text(code: u16) -> &'static str {
    if let Some((_, text)) = EXTENDED.iter().find(|(known, _)| *known == code) {
        return text;
    }

    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or(UNKNOWN_STATUS_TEXT)
}
