//! Struct tag literals
//!
//! A struct tag is the raw metadata string attached to a field with
//! `#[reflect(tag = "...")]`. It holds space separated `key:"value"` pairs,
//! and each value may itself be a comma separated list whose first segment
//! is the tag name and the rest are options:
//!
//! ```text
//! value:"foo,option 1,option 2" age:"18"
//! ```

use thiserror::Error;

/// Syntax errors raised while parsing a struct tag literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TagSyntaxError {
    #[error("bad syntax for struct tag pair")]
    Pair,

    #[error("bad syntax for struct tag key")]
    Key,

    #[error("bad syntax for struct tag value")]
    Value,
}

/// One parsed `key:"value"` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPair {
    pub key: String,
    pub value: String,
}

impl TagPair {
    /// First comma separated segment of the value
    pub fn name(&self) -> &str {
        self.value.split(',').next().unwrap_or_default()
    }

    /// Remaining comma separated segments of the value
    pub fn options(&self) -> Vec<&str> {
        self.value.split(',').skip(1).collect()
    }
}

/// Raw struct tag literal of a reflected field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StructTag(&'static str);

impl StructTag {
    /// Wrap a raw tag literal
    pub const fn new(raw: &'static str) -> Self {
        Self(raw)
    }

    /// The literal as written on the field
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Look up the value associated with `key`.
    ///
    /// Lookup is lenient: scanning stops at the first malformed pair and
    /// reports the key as absent instead of failing.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut rest = self.0;
        while let Some(step) = next_pair(rest) {
            match step {
                Ok((pair, remaining)) => {
                    if pair.key == key {
                        return Some(pair.value);
                    }
                    rest = remaining;
                }
                Err(_) => return None,
            }
        }
        None
    }

    /// Parse every pair, failing on the first malformed one
    pub fn parse(&self) -> Result<Vec<TagPair>, TagSyntaxError> {
        let mut pairs = Vec::new();
        let mut rest = self.0;
        while let Some(step) = next_pair(rest) {
            let (pair, remaining) = step?;
            pairs.push(pair);
            rest = remaining;
        }
        Ok(pairs)
    }
}

impl std::fmt::Display for StructTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Scan the next pair off `tag`, returning `None` once only spaces remain
fn next_pair(tag: &str) -> Option<Result<(TagPair, &str), TagSyntaxError>> {
    let tag = tag.trim_start_matches(' ');
    if tag.is_empty() {
        return None;
    }

    let bytes = tag.as_bytes();
    let mut i = 0;
    while i < bytes.len()
        && bytes[i] > b' '
        && bytes[i] != b':'
        && bytes[i] != b'"'
        && bytes[i] != 0x7f
    {
        i += 1;
    }
    if i == 0 {
        return Some(Err(TagSyntaxError::Key));
    }
    if i + 1 >= bytes.len() || bytes[i] != b':' {
        return Some(Err(TagSyntaxError::Pair));
    }
    if bytes[i + 1] != b'"' {
        return Some(Err(TagSyntaxError::Value));
    }

    let key = &tag[..i];
    let quoted = &tag[i + 1..];
    let quoted_bytes = quoted.as_bytes();

    let mut j = 1;
    while j < quoted_bytes.len() && quoted_bytes[j] != b'"' {
        if quoted_bytes[j] == b'\\' {
            j += 1;
        }
        j += 1;
    }
    if j >= quoted_bytes.len() {
        return Some(Err(TagSyntaxError::Value));
    }

    let value = match unquote(&quoted[1..j]) {
        Some(value) => value,
        None => return Some(Err(TagSyntaxError::Value)),
    };

    Some(Ok((
        TagPair {
            key: key.to_string(),
            value,
        },
        &quoted[j + 1..],
    )))
}

fn unquote(inner: &str) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            other => out.push(other),
        }
    }
    Some(out)
}
