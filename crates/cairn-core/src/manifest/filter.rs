//! Allow/deny path filters applied while walking a tree
//!
//! A rule file holds one rule per line:
//!
//! ```text
//! deny	*.tmp
//! allow	/keep/*.log
//! deny	$\.log$
//! ```
//!
//! The verb and pattern are separated by a tab (any whitespace is accepted
//! as a fallback). Patterns starting with `$` are regular expressions;
//! anything else is a glob where `*` matches any run of characters and `?`
//! one character. Matching is case-insensitive and unanchored against the
//! `/`-prefixed relative path. The first matching rule decides; a path no
//! rule matches is allowed.

use crate::errors::{CairnError, Result};
use regex::{Regex, RegexBuilder};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone)]
pub struct FilterRule {
    action: FilterAction,
    pattern: Regex,
    source: String,
}

impl FilterRule {
    /// Parse one `verb<TAB>pattern` rule
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::InvalidFilterRule`] for an unknown verb, an
    /// empty pattern or a regex that does not compile.
    pub fn parse(line: &str) -> Result<Self> {
        let invalid = |reason: String| CairnError::InvalidFilterRule {
            rule: line.to_string(),
            reason,
        };

        let (verb, pattern) = line
            .split_once('\t')
            .or_else(|| line.split_once(char::is_whitespace))
            .ok_or_else(|| invalid("expected '<allow|deny><TAB><pattern>'".to_string()))?;
        let pattern = pattern.trim();

        let action = match verb.trim().to_ascii_lowercase().as_str() {
            "allow" => FilterAction::Allow,
            "deny" => FilterAction::Deny,
            other => return Err(invalid(format!("unknown verb '{}'", other))),
        };
        if pattern.is_empty() {
            return Err(invalid("pattern is empty".to_string()));
        }

        let expr = match pattern.strip_prefix('$') {
            Some(raw) => raw.to_string(),
            None => glob_to_regex(pattern),
        };
        let pattern = RegexBuilder::new(&expr)
            .case_insensitive(true)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            action,
            pattern,
            source: line.to_string(),
        })
    }

    pub fn action(&self) -> FilterAction {
        self.action
    }

    /// The rule text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut expr = String::with_capacity(glob.len() * 2);
    for c in glob.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    expr
}

/// Ordered rule list
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    rules: Vec<FilterRule>,
}

impl PathFilter {
    /// A filter with no rules, which allows everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Build a filter from rule lines
    ///
    /// Blank lines and lines starting with `#` are ignored. Lines that fail
    /// to parse are returned alongside the filter instead of aborting, so a
    /// single bad rule does not disable the rest.
    pub fn from_lines<I, S>(lines: I) -> (Self, Vec<CairnError>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        let mut errors = Vec::new();
        for line in lines {
            let line = line.as_ref().trim_end_matches(&['\r', '\n'][..]);
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            match FilterRule::parse(line) {
                Ok(rule) => rules.push(rule),
                Err(e) => errors.push(e),
            }
        }
        (Self { rules }, errors)
    }

    /// Read rule lines from a file
    ///
    /// # Errors
    ///
    /// Returns [`CairnError::Read`] if the file cannot be read. Bad rules
    /// are returned in the second tuple element, not as an error.
    pub fn load_file(path: &Path) -> Result<(Self, Vec<CairnError>)> {
        let text = std::fs::read_to_string(path).map_err(|e| CairnError::read(path, &e))?;
        Ok(Self::from_lines(text.lines()))
    }

    /// Append the rules of `other` after this filter's rules
    pub fn extend(&mut self, other: PathFilter) {
        self.rules.extend(other.rules);
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide whether `path` is kept
    pub fn allows(&self, path: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.is_match(path))
            .map_or(true, |rule| rule.action == FilterAction::Allow)
    }
}
