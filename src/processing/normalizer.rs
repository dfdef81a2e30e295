use crate::models::ScanText;

/// Build the matching and extraction views of an OCR blob.
///
/// `normalized` is lowercased with all whitespace runs collapsed to a single
/// space. `lines` keeps original casing, trimmed, with empty lines dropped.
pub fn normalize(raw: &str) -> ScanText {
    let normalized = collapse_whitespace(&raw.to_lowercase());
    let lines = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    ScanText {
        raw: raw.to_string(),
        normalized,
        lines,
    }
}

/// Lowercase and collapse whitespace; the form labels and lines are
/// compared in.
pub fn normalize_fragment(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_line_case() {
        let scan = normalize("  PASSPORT \r\n\n Name:   John   DOE\t\n");
        assert_eq!(scan.normalized, "passport name: john doe");
        assert_eq!(scan.lines, vec!["PASSPORT".to_string(), "Name:   John   DOE".to_string()]);
        assert!(scan.raw.starts_with("  PASSPORT"));
    }

    #[test]
    fn test_empty_input() {
        let scan = normalize("");
        assert!(scan.is_empty());
        assert_eq!(scan.normalized, "");

        let blank = normalize(" \n\t\n ");
        assert!(blank.is_empty());
        assert_eq!(blank.normalized, "");
    }
}
