//! Path pattern compilation.
//!
//! A pattern such as `/users/:id(\d+)/posts/:slug?` compiles to a regular
//! expression plus the ordered list of parameter names it binds. Compilation
//! happens once, at declaration or rebase time; matching afterwards is a pure
//! function of the compiled object and the path.
//!
//! # Grammar
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `:name` | one path segment bound to `name` (`[^/]+?`) |
//! | `:name(re)` | segment matching the custom expression `re` |
//! | `:name?` | optional; the `/` before it becomes optional too |
//! | `*` | catch-all bound to `"0"`, `"1"`, ... in order of appearance |
//!
//! Every other character is matched literally. Parameter values are returned
//! as they appear in the path, without percent-decoding.

use {
    crate::{Error, Result},
    regex::Regex,
    std::collections::HashMap,
};

const DEFAULT_SEGMENT: &str = "[^/]+?";

/// Options controlling how a pattern is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Case-sensitive matching of literal text.
    pub sensitive: bool,
    /// Trailing slash is significant.
    pub strict: bool,
    /// The match must consume the whole path. When false the pattern matches
    /// as a prefix ending at a `/` boundary.
    pub end: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: true,
        }
    }
}

impl MatchOptions {
    /// Same options, matching as a prefix.
    pub fn prefix(self) -> Self {
        Self { end: false, ..self }
    }
}

/// The compiled form of a path pattern.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    pattern: String,
    options: MatchOptions,
    regex: Regex,
    keys: Vec<String>,
}

impl CompiledMatcher {
    /// Compiles `pattern` with the given options.
    ///
    /// ```rust
    /// use axum_dispatch::{CompiledMatcher, MatchOptions};
    ///
    /// let matcher = CompiledMatcher::compile("/users/:id", MatchOptions::default()).unwrap();
    /// assert!(matcher.test("/users/42"));
    /// assert_eq!(matcher.exec("/users/42").unwrap()["id"], "42");
    /// assert!(matcher.exec("/users").is_none());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Pattern`](crate::ErrorKind::Pattern) error when the
    /// pattern does not start with `/`, a placeholder has no name, a group is
    /// unbalanced or holds an invalid expression, or a name is bound twice.
    pub fn compile(pattern: &str, options: MatchOptions) -> Result<Self> {
        let (source, keys) = translate(pattern, options)?;
        let regex = Regex::new(&source)
            .map_err(|err| Error::pattern(format!("invalid pattern {pattern:?}: {err}")))?;

        Ok(Self {
            pattern: pattern.to_string(),
            options,
            regex,
            keys,
        })
    }

    /// The source pattern this matcher was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Parameter names in left-to-right order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns true when `path` matches.
    pub fn test(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the parameter bindings when `path` matches.
    ///
    /// Optional parameters that did not participate in the match are absent
    /// from the map.
    pub fn exec(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let params = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(index, key)| {
                captures
                    .name(&group_name(index))
                    .map(|value| (key.clone(), value.as_str().to_string()))
            })
            .collect();
        Some(params)
    }
}

fn group_name(index: usize) -> String {
    format!("p{index}")
}

/// Translates a pattern into regex source and its ordered parameter names.
fn translate(pattern: &str, options: MatchOptions) -> Result<(String, Vec<String>)> {
    if !pattern.starts_with('/') && pattern != "*" {
        return Err(Error::pattern(format!(
            "pattern {pattern:?} must start with '/'"
        )));
    }

    let body = match pattern.strip_suffix('/') {
        Some(stripped) if !options.strict => stripped,
        _ => pattern,
    };

    let mut out = String::from(if options.sensitive { "^" } else { "(?i)^" });
    let mut keys: Vec<String> = Vec::new();
    let mut anonymous = 0usize;
    let mut chars = body.char_indices().peekable();
    let mut prev: Option<char> = None;

    while let Some((pos, ch)) = chars.next() {
        match ch {
            ':' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(Error::pattern(format!(
                        "missing parameter name at position {pos} in {pattern:?}"
                    )));
                }
                if keys.contains(&name) {
                    return Err(Error::pattern(format!(
                        "duplicate parameter name {name:?} in {pattern:?}"
                    )));
                }

                let custom = match chars.peek() {
                    Some(&(open, '(')) => {
                        chars.next();
                        Some(read_group(&mut chars, open, pattern)?)
                    }
                    _ => None,
                };
                let optional = matches!(chars.peek(), Some(&(_, '?')));
                if optional {
                    chars.next();
                }

                let capture = format!(
                    "(?P<{}>{})",
                    group_name(keys.len()),
                    custom.as_deref().unwrap_or(DEFAULT_SEGMENT)
                );
                keys.push(name);

                if optional && prev == Some('/') {
                    out.pop();
                    out.push_str(&format!("(?:/{capture})?"));
                } else if optional {
                    out.push_str(&format!("{capture}?"));
                } else {
                    out.push_str(&capture);
                }
                prev = Some(':');
            }
            '*' => {
                let name = anonymous.to_string();
                anonymous += 1;
                out.push_str(&format!("(?P<{}>.*)", group_name(keys.len())));
                keys.push(name);
                prev = Some('*');
            }
            '(' | ')' | '?' => {
                return Err(Error::pattern(format!(
                    "unexpected {ch:?} at position {pos} in {pattern:?}"
                )));
            }
            _ => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
                prev = Some(ch);
            }
        }
    }

    if !options.strict {
        out.push_str("/?");
    }
    out.push_str(if options.end { "$" } else { "(?:/|$)" });

    Ok((out, keys))
}

/// Reads a balanced `( ... )` group whose opening parenthesis was consumed.
fn read_group<I>(
    chars: &mut std::iter::Peekable<I>,
    open: usize,
    pattern: &str,
) -> Result<String>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut depth = 1usize;
    let mut inner = String::new();

    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                inner.push(c);
                if let Some((_, escaped)) = chars.next() {
                    inner.push(escaped);
                }
            }
            '(' => {
                depth += 1;
                inner.push(c);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if inner.is_empty() {
                        return Err(Error::pattern(format!(
                            "empty group at position {open} in {pattern:?}"
                        )));
                    }
                    return Ok(inner);
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
    }

    Err(Error::pattern(format!(
        "unbalanced '(' at position {open} in {pattern:?}"
    )))
}
