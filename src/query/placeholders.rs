//! Named `:param` placeholders inside SQL text.

use super::is_identifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// Byte offset of the leading `:`.
    pub start: usize,
    /// Byte offset one past the last name character.
    pub end: usize,
}

/// Finds every `:name` placeholder outside of quoted regions.
pub fn scan(sql: &str) -> Vec<Placeholder> {
    let bytes = sql.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i = skip_quoted(bytes, i, quote);
            }
            b':' => {
                let name_start = i + 1;
                let mut end = name_start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                let name = &sql[name_start..end];
                if is_identifier(name) {
                    found.push(Placeholder {
                        name: name.to_string(),
                        start: i,
                        end,
                    });
                    i = end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    found
}

// Returns the offset after the closing quote; a doubled quote is an escaped quote.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Whether `keyword` appears as a whole word outside of quoted regions, ignoring case.
pub fn has_keyword(sql: &str, keyword: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i = skip_quoted(bytes, i, quote);
            }
            b if b.is_ascii_alphanumeric() || b == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                // `:from` is a placeholder, not the keyword
                let is_placeholder = start > 0 && bytes[start - 1] == b':';
                if !is_placeholder && sql[start..i].eq_ignore_ascii_case(keyword) {
                    return true;
                }
            }
            _ => i += 1,
        }
    }

    false
}

/// Distinct placeholder names in order of first use.
pub fn distinct_names(sql: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for placeholder in scan(sql) {
        if !names.contains(&placeholder.name) {
            names.push(placeholder.name);
        }
    }
    names
}

/// Rewrites named placeholders to positional `?` markers.
///
/// The returned names line up with the markers, so a name used twice appears twice.
pub fn positional(sql: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(sql.len());
    let mut names = Vec::new();
    let mut last = 0;

    for placeholder in scan(sql) {
        out.push_str(&sql[last..placeholder.start]);
        out.push('?');
        last = placeholder.end;
        names.push(placeholder.name);
    }
    out.push_str(&sql[last..]);

    (out, names)
}
