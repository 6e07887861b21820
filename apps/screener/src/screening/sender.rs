use std::sync::OnceLock;

use regex::Regex;

fn angle_address() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([^>]+)>").expect("static regex"))
}

/// Pulls the sender address out of a `From` header value.
///
/// `Jane Doe <jane@x.com>` and `jane@x.com` both yield `jane@x.com`;
/// a bare display name yields `None`.
pub fn extract_email_from_header(value: &str) -> Option<String> {
    if let Some(caps) = angle_address().captures(value) {
        return Some(caps[1].to_string());
    }
    let trimmed = value.trim();
    trimmed.contains('@').then(|| trimmed.to_string())
}
