//! Listing name filters
//!
//! A filter string holds one or more patterns separated by `:` or `,`.
//! Patterns with `*` or `?` are globs matched against the whole name;
//! anything else is an extension (`iso`, `.iso`). Matching ignores case.

use regex::Regex;

use crate::fs::Entry;

/// Convert a glob pattern (with * and ?) to a regex pattern
pub fn glob_to_regex(pattern: &str, case_sensitive: bool) -> String {
    let mut regex = if case_sensitive {
        String::from("^")
    } else {
        String::from("(?i)^")
    };
    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\' => {
                regex.push('\\');
                regex.push(c);
            }
            _ => regex.push(c),
        }
    }
    regex.push('$');
    regex
}

/// Compiled name filter
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    patterns: Vec<Regex>,
}

impl NameFilter {
    pub fn parse(filter: &str) -> Self {
        let patterns = filter
            .split([':', ','])
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(|token| {
                let glob = if token.contains(['*', '?']) {
                    token.to_string()
                } else {
                    format!("*.{}", token.trim_start_matches('.'))
                };
                match Regex::new(&glob_to_regex(&glob, false)) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!("ignoring filter pattern {:?}: {}", token, e);
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// A filter with no patterns accepts everything
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.is_empty() || self.patterns.iter().any(|re| re.is_match(entry.bare_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Location;

    fn entry(name: &str) -> Entry {
        Entry::remote(name, Location::parse(&format!("http://example.com/{}", name)))
    }

    fn filtered(names: &[&str], filter: Option<&str>) -> Vec<String> {
        let entries: Vec<Entry> = names.iter().map(|n| entry(n)).collect();
        let filter = filter.map(NameFilter::parse).unwrap_or_default();
        entries.into_iter().filter(|e| filter.matches(e)).map(|e| e.name).collect()
    }

    #[test]
    fn test_glob_to_regex() {
        assert_eq!(glob_to_regex("*.iso", false), r"(?i)^.*\.iso$");
        assert_eq!(glob_to_regex("a?c", true), "^a.c$");
    }

    #[test]
    fn test_glob_ignores_case() {
        assert_eq!(
            filtered(&["Game.ISO", "game.iso", "readme.txt"], Some("*.iso")),
            vec!["Game.ISO", "game.iso"]
        );
    }

    #[test]
    fn test_extension_list() {
        assert_eq!(
            filtered(&["a.iso", "b.CSO", "c.pbp", "d.txt"], Some("iso:cso:.pbp:")),
            vec!["a.iso", "b.CSO", "c.pbp"]
        );
    }

    #[test]
    fn test_empty_filter_keeps_all() {
        assert_eq!(filtered(&["a", "b/"], None), vec!["a", "b/"]);
        assert_eq!(filtered(&["a", "b/"], Some("")), vec!["a", "b/"]);
        assert_eq!(filtered(&["a", "b/"], Some(" : ")), vec!["a", "b/"]);
    }

    #[test]
    fn test_directory_marker_ignored_for_matching() {
        assert_eq!(filtered(&["saves/", "iso/"], Some("s*")), vec!["saves/"]);
    }

    #[test]
    fn test_regex_chars_are_literal() {
        assert_eq!(
            filtered(&["a+b (1).iso", "ab 1.iso"], Some("a+b (1).*")),
            vec!["a+b (1).iso"]
        );
    }
}
