use std::collections::HashMap;

pub const MAX_NAME_LEN: usize = 32;

/// Usernames arrive on the connection URL as `?user=<name>` and are the
/// stable identity: a reconnect under the same name resumes the same lobby
/// user. Whitespace is trimmed; empty and oversized names are refused
/// before any socket state exists.
pub fn identify(query: &HashMap<String, String>) -> Option<String> {
    let name = query.get("user")?.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return None;
    }
    Some(name.to_string())
}
