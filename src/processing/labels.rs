use log::trace;
use regex::Regex;

use crate::models::{ScanText, Strategy};
use crate::processing::normalizer::normalize_fragment;

/// Produces candidate values for `label`, in line order.
pub type LabelStrategy = fn(&str, &ScanText) -> Vec<String>;

/// The four escalating label strategies, tried in this order.
pub const LABEL_STRATEGIES: [(Strategy, LabelStrategy); 4] = [
    (Strategy::LabelSubstring, substring_after_label),
    (Strategy::LabelRegex, bounded_regex),
    (Strategy::LabelLineStart, line_starts_with_label),
    (Strategy::LabelFuzzy, fuzzy_word_overlap),
];

/// A value resolved for a label; `T` is whatever the acceptance
/// predicate turned the raw text into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMatch<T = String> {
    pub value: T,
    pub strategy: Strategy,
}

/// First non-empty value for `label`, escalating through the strategies.
pub fn find_by_label(label: &str, scan: &ScanText) -> Option<LabelMatch> {
    find_by_labels(&[label], scan, |value| Some(value.to_string()))
}

/// Resolve a value for any of `labels`.
///
/// Strategies are the outer loop so an exact match for a later synonym
/// beats a fuzzy match for an earlier one. `accept` validates and
/// cleans each candidate; a rejected candidate does not stop the search.
pub fn find_by_labels<T, F>(labels: &[&str], scan: &ScanText, accept: F) -> Option<LabelMatch<T>>
where
    F: Fn(&str) -> Option<T>,
{
    let labels: Vec<&str> = labels
        .iter()
        .copied()
        .filter(|label| mentions_label(label, scan))
        .collect();
    if labels.is_empty() {
        return None;
    }

    for (strategy, run) in LABEL_STRATEGIES.iter() {
        for label in &labels {
            for candidate in run(label, scan) {
                if let Some(value) = accept(&candidate) {
                    trace!("Label '{}' resolved by {}", label, strategy);
                    return Some(LabelMatch { value, strategy: *strategy });
                }
                trace!("Label '{}' candidate rejected by {}", label, strategy);
            }
        }
    }
    None
}

/// Cheap check against the normalized full text: at least one significant
/// word of the label must occur somewhere.
fn mentions_label(label: &str, scan: &ScanText) -> bool {
    let normalized = normalize_fragment(label);
    if normalized.is_empty() {
        return false;
    }
    if scan.normalized.contains(&normalized) {
        return true;
    }
    significant_words(label)
        .iter()
        .any(|word| scan.normalized.contains(word.as_str()))
}

fn significant_words(label: &str) -> Vec<String> {
    normalize_fragment(label)
        .split(' ')
        .filter(|word| word.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Case-insensitive pattern for a label, tolerant of whitespace runs.
fn label_pattern(label: &str) -> String {
    normalize_fragment(label)
        .split(' ')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

/// Strip leading `:;.,` and whitespace delimiters and trailing whitespace.
pub fn clean_value(text: &str) -> String {
    text.trim_start_matches(|c: char| matches!(c, ':' | ';' | '.' | ',') || c.is_whitespace())
        .trim_end()
        .to_string()
}

/// Text following the first case-insensitive occurrence of the label.
pub fn substring_after_label(label: &str, scan: &ScanText) -> Vec<String> {
    let Some(re) = compile(&format!("(?i){}", label_pattern(label))) else {
        return Vec::new();
    };
    scan.lines
        .iter()
        .filter_map(|line| re.find(line).map(|m| clean_value(&line[m.end()..])))
        .filter(|value| !value.is_empty())
        .collect()
}

/// `\blabel\b[^A-Za-z0-9]?\s*([\w\s]+)` per line.
pub fn bounded_regex(label: &str, scan: &ScanText) -> Vec<String> {
    let pattern = format!(r"(?i)\b{}\b[^A-Za-z0-9]?\s*([\w\s]+)", label_pattern(label));
    let Some(re) = compile(&pattern) else {
        return Vec::new();
    };
    scan.lines
        .iter()
        .filter_map(|line| re.captures(line).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// A line that begins with the label: the rest of that line, or the whole
/// next line when the label stands alone.
pub fn line_starts_with_label(label: &str, scan: &ScanText) -> Vec<String> {
    let normalized_label = normalize_fragment(label);
    let Some(re) = compile(&format!(r"(?i)^\s*{}", label_pattern(label))) else {
        return Vec::new();
    };

    let mut values = Vec::new();
    for (index, line) in scan.lines.iter().enumerate() {
        if !normalize_fragment(line).starts_with(&normalized_label) {
            continue;
        }
        let rest = re.find(line).map(|m| clean_value(&line[m.end()..])).unwrap_or_default();
        if !rest.is_empty() {
            values.push(rest);
        } else if let Some(next) = scan.lines.get(index + 1) {
            values.push(next.trim().to_string());
        }
    }
    values
}

/// More than half of the label's significant words (longer than two
/// characters) appear on a line: take the text after the right-most one.
/// Labels with a single significant word are left to the exact strategies.
pub fn fuzzy_word_overlap(label: &str, scan: &ScanText) -> Vec<String> {
    let words = significant_words(label);
    if words.len() < 2 {
        return Vec::new();
    }
    let patterns: Vec<Regex> = words
        .iter()
        .filter_map(|word| compile(&format!("(?i){}", regex::escape(word))))
        .collect();

    let mut values = Vec::new();
    for line in &scan.lines {
        let ends: Vec<usize> = patterns
            .iter()
            .filter_map(|re| re.find(line).map(|m| m.end()))
            .collect();
        if ends.len() * 2 <= words.len() {
            continue;
        }
        if let Some(end) = ends.iter().max() {
            let value = clean_value(&line[*end..]);
            if !value.is_empty() {
                values.push(value);
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::normalizer::normalize;

    #[test]
    fn test_substring_after_label_keeps_case() {
        let scan = normalize("REPUBLIC OF TESTLAND\nNationality: Malaysian\n");
        let found = find_by_label("nationality", &scan).unwrap();
        assert_eq!(found.value, "Malaysian");
        assert_eq!(found.strategy, Strategy::LabelSubstring);
    }

    #[test]
    fn test_strip_leading_delimiters() {
        let scan = normalize("Document No.: ;  A1234567");
        assert_eq!(find_by_label("document no", &scan).unwrap().value, "A1234567");
    }

    #[test]
    fn test_label_on_its_own_line() {
        let scan = normalize("Full Name\nSITI BINTI RAHMAN\nSex F");
        assert_eq!(line_starts_with_label("full name", &scan), vec!["SITI BINTI RAHMAN".to_string()]);
    }

    #[test]
    fn test_next_line_value_through_cascade() {
        let scan = normalize("Full Name\nSITI BINTI RAHMAN");
        let found = find_by_labels(&["full name"], &scan, |v| {
            if v.chars().any(|c| c.is_alphabetic()) { Some(v.to_string()) } else { None }
        })
        .unwrap();
        assert_eq!(found.value, "SITI BINTI RAHMAN");
        assert_eq!(found.strategy, Strategy::LabelLineStart);
    }

    #[test]
    fn test_bounded_regex_capture() {
        let scan = normalize("Issued by: Home Office, London");
        assert_eq!(bounded_regex("issued by", &scan), vec!["Home Office".to_string()]);
    }

    #[test]
    fn test_fuzzy_match_with_dropped_word() {
        let scan = normalize("PASSPORT\nPassport authority: JPN Kuala Lumpur");
        let found = find_by_label("passport issuing authority", &scan).unwrap();
        assert_eq!(found.value, "JPN Kuala Lumpur");
        assert_eq!(found.strategy, Strategy::LabelFuzzy);
    }

    #[test]
    fn test_fuzzy_skips_single_word_labels() {
        let scan = normalize("Property Address: 42 Harbour View Rd\nProperty Tax Year 2024");
        assert!(fuzzy_word_overlap("property id", &scan).is_empty());
        assert!(fuzzy_word_overlap("tax id", &scan).is_empty());
        assert!(find_by_label("tax id", &scan).is_none());
    }

    #[test]
    fn test_typed_acceptance() {
        let scan = normalize("Seats: 42");
        let found = find_by_labels(&["seats"], &scan, |v| v.parse::<u32>().ok()).unwrap();
        assert_eq!(found.value, 42);
        assert_eq!(found.strategy, Strategy::LabelSubstring);
    }

    #[test]
    fn test_fuzzy_requires_majority() {
        let scan = normalize("Date: 2020-01-01");
        assert!(fuzzy_word_overlap("date of expiry", &scan).is_empty());
    }

    #[test]
    fn test_rejected_candidates_continue() {
        let scan = normalize("Passport No: PENDING\nPassport No: A9876543");
        let found = find_by_labels(&["passport no"], &scan, |v| {
            if v.chars().any(|c| c.is_ascii_digit()) { Some(v.to_string()) } else { None }
        })
        .unwrap();
        assert_eq!(found.value, "A9876543");
    }

    #[test]
    fn test_missing_label() {
        let scan = normalize("nothing to see");
        assert!(find_by_label("nationality", &scan).is_none());
        assert!(find_by_label("", &scan).is_none());
    }
}
