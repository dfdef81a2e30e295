use log::trace;
use regex::Regex;

use crate::models::ScanText;

/// Ordered list of synonym patterns for one field. Capture group 1 is the
/// value when present, otherwise the whole match.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub name: &'static str,
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile a static pattern list. Panics on an invalid pattern, which
    /// is a programming error in the table.
    pub fn new(name: &'static str, sources: &[&str]) -> Self {
        let patterns = sources
            .iter()
            .map(|source| Regex::new(source).unwrap())
            .collect();
        PatternSet { name, patterns }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Every capture in `text`, pattern by pattern, in match order.
    pub fn captures<'t>(&'t self, text: &'t str) -> impl Iterator<Item = String> + 't {
        self.patterns.iter().flat_map(move |re| {
            re.captures_iter(text).filter_map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str().trim().to_string())
                    .filter(|value| !value.is_empty())
            })
        })
    }

    /// First capture in `text` that `accept` keeps.
    pub fn first_accepted<F>(&self, text: &str, accept: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.captures(text).find_map(|candidate| accept(&candidate))
    }

    /// Whole text first, then line by line.
    pub fn search<F>(&self, scan: &ScanText, accept: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let whole = scan.joined();
        if let Some(value) = self.first_accepted(&whole, &accept) {
            trace!("Pattern set '{}' matched in full text", self.name);
            return Some(value);
        }
        scan.lines
            .iter()
            .find_map(|line| self.first_accepted(line, &accept))
            .map(|value| {
                trace!("Pattern set '{}' matched on a single line", self.name);
                value
            })
    }
}
