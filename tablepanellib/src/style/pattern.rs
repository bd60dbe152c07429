//! Style pattern strings.
//!
//! Patterns are written either as `/body/flags` regex literals or as plain
//! names. Plain names are anchored (`^name$`) but otherwise still regex
//! syntax, so `Value #.` matches `Value #A`.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::error::TablePanelError;
use crate::Result;

fn literal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/(.*?)/(g?i?m?s?u?y?)$").expect("valid regex"))
}

/// A compiled column name pattern.
#[derive(Debug, Clone)]
pub struct StylePattern {
    source: String,
    regex: Regex,
    global: bool,
}

impl StylePattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |message: String| TablePanelError::InvalidPattern {
            pattern: pattern.to_string(),
            message,
        };

        if !pattern.starts_with('/') {
            let regex = Regex::new(&format!("^{}$", pattern)).map_err(|e| invalid(e.to_string()))?;
            return Ok(Self {
                source: pattern.to_string(),
                regex,
                global: false,
            });
        }

        let caps = literal_regex()
            .captures(pattern)
            .ok_or_else(|| invalid("not a valid regular expression".to_string()))?;
        let body = caps.get(1).map_or("", |m| m.as_str());
        let flags = caps.get(2).map_or("", |m| m.as_str());

        let regex = RegexBuilder::new(body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
            global: flags.contains('g'),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Replace the matched part of `text` with `alias`.
    ///
    /// `alias` may reference groups as `$1`, `$<name>` or `$&`; only the
    /// first match is replaced unless the pattern carries the `g` flag.
    pub fn apply_alias(&self, text: &str, alias: &str) -> String {
        let replacement = translate_replacement(alias, self.regex.captures_len());
        if self.global {
            self.regex.replace_all(text, replacement.as_str()).into_owned()
        } else {
            self.regex.replace(text, replacement.as_str()).into_owned()
        }
    }
}

/// Rewrite a `$`-style replacement into the `regex` crate's syntax.
///
/// `$1`/`$12` become `${1}`/`${12}` (two digits only when that group
/// exists), `$<name>` becomes `${name}`, `$&` becomes `${0}`, `$$` stays a
/// literal dollar, and any other `$` is literal.
fn translate_replacement(alias: &str, group_count: usize) -> String {
    let chars: Vec<char> = alias.chars().collect();
    let mut out = String::with_capacity(alias.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '$' || i + 1 >= chars.len() {
            if c == '$' {
                out.push_str("$$");
            } else {
                out.push(c);
            }
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        match next {
            '$' => {
                out.push_str("$$");
                i += 2;
            }
            '&' => {
                out.push_str("${0}");
                i += 2;
            }
            '<' => match chars[i + 2..].iter().position(|&ch| ch == '>') {
                Some(end) => {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    out.push_str(&format!("${{{}}}", name));
                    i += 3 + end;
                }
                None => {
                    out.push_str("$$");
                    i += 1;
                }
            },
            d if d.is_ascii_digit() => {
                let first = d.to_digit(10).unwrap_or(0) as usize;
                let two = chars
                    .get(i + 2)
                    .and_then(|ch| ch.to_digit(10))
                    .map(|second| first * 10 + second as usize)
                    .filter(|&group| group > 0 && group < group_count);
                match two {
                    Some(group) => {
                        out.push_str(&format!("${{{}}}", group));
                        i += 3;
                    }
                    None if first > 0 && first < group_count => {
                        out.push_str(&format!("${{{}}}", first));
                        i += 2;
                    }
                    None => {
                        out.push_str("$$");
                        i += 1;
                    }
                }
            }
            _ => {
                out.push_str("$$");
                i += 1;
            }
        }
    }

    out
}
