//! Small string helpers shared by settings and the engine.

/// Characters that KEYS or the in-memory matcher treat as pattern syntax.
/// A backslash escapes the next character in both; braces are alternation
/// in globset.
const GLOB_META: [char; 7] = ['*', '?', '[', ']', '\\', '{', '}'];

/// Turn an application name into a key-safe slug.
///
/// Every run of characters that is not ASCII alphanumeric becomes a single
/// `_`, and leading or trailing `_` are dropped. Case is preserved.
///
/// # Example
/// ```
/// use redis_cache_engine::utils::slug;
///
/// assert_eq!(slug("My Shop (EU)"), "My_Shop_EU");
/// ```
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }
    out
}

/// Returns `true` if `s` contains a KEYS glob metacharacter.
pub fn has_glob_meta(s: &str) -> bool {
    s.contains(GLOB_META)
}
