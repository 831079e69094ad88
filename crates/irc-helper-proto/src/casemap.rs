//! Nickname and channel case folding.
//!
//! Servers compare names with the rfc1459 mapping: ASCII letters fold to
//! lowercase and `[]\~` are the uppercase forms of `{}|^`. Everything the
//! bot keys by name (permissions, the self filter, channel matching) folds
//! through here so two spellings the server treats as one user never split.

/// Fold one character.
#[inline]
pub const fn fold_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c.to_ascii_lowercase(),
    }
}

/// Fold a whole name. Non-ASCII characters pass through unchanged.
pub fn fold(name: &str) -> String {
    name.chars().map(fold_char).collect()
}

/// Whether two names are the same under the server's casemapping.
pub fn eq(a: &str, b: &str) -> bool {
    // Folding never changes a character's encoded width.
    a.len() == b.len() && a.chars().map(fold_char).eq(b.chars().map(fold_char))
}
