use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// ICAO three-letter codes seen on the MRZ name line.
    pub static ref MRZ_COUNTRY_NAMES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("MYS", "Malaysia");
        m.insert("USA", "United States");
        m.insert("GBR", "United Kingdom");
        m.insert("CAN", "Canada");
        m.insert("AUS", "Australia");
        m.insert("NZL", "New Zealand");
        m.insert("DEU", "Germany");
        m.insert("D<<", "Germany");
        m.insert("FRA", "France");
        m.insert("SGP", "Singapore");
        m.insert("IDN", "Indonesia");
        m.insert("IND", "India");
        m.insert("CHN", "China");
        m.insert("JPN", "Japan");
        m.insert("MEX", "Mexico");
        m
    };

    /// Phrases that name a country of citizenship in free text, longest first
    /// so "new zealand" wins over "zealand"-like fragments.
    pub static ref CITIZEN_COUNTRIES: Vec<(&'static str, &'static str)> = vec![
        ("united states of america", "United States"),
        ("united states", "United States"),
        ("united kingdom", "United Kingdom"),
        ("new zealander", "New Zealand"),
        ("new zealand", "New Zealand"),
        ("warganegara malaysia", "Malaysia"),
        ("malaysian", "Malaysia"),
        ("malaysia", "Malaysia"),
        ("american", "United States"),
        ("british", "United Kingdom"),
        ("canadian", "Canada"),
        ("canada", "Canada"),
        ("australian", "Australia"),
        ("australia", "Australia"),
        ("german", "Germany"),
        ("germany", "Germany"),
        ("deutsch", "Germany"),
        ("french", "France"),
        ("france", "France"),
        ("singaporean", "Singapore"),
        ("singapore", "Singapore"),
        ("indonesian", "Indonesia"),
        ("indonesia", "Indonesia"),
        ("mexican", "Mexico"),
        ("mexico", "Mexico"),
    ];
}

/// Nationality for an MRZ country code. Unknown codes pass through verbatim.
pub fn nationality_for_code(code: &str) -> String {
    MRZ_COUNTRY_NAMES
        .get(code)
        .map(|name| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Whether `code` is one of the known MRZ country codes.
pub fn is_known_code(code: &str) -> bool {
    MRZ_COUNTRY_NAMES.contains_key(code)
}

/// Classify free text into a nationality from the closed citizen table.
/// Matches whole words only; a known three-letter code also counts.
pub fn classify_citizenship(text: &str) -> Option<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let padded_text = format!(" {} ", cleaned.split_whitespace().collect::<Vec<_>>().join(" "));
    for (phrase, country) in CITIZEN_COUNTRIES.iter() {
        if padded_text.contains(&format!(" {} ", phrase)) {
            return Some(country.to_string());
        }
    }

    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|token| token.len() == 3 && token.chars().all(|c| c.is_ascii_uppercase()))
        .find(|token| is_known_code(token))
        .map(nationality_for_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_lookup() {
        assert_eq!(nationality_for_code("MYS"), "Malaysia");
        assert_eq!(nationality_for_code("USA"), "United States");
        assert_eq!(nationality_for_code("UTO"), "UTO");
    }

    #[test]
    fn test_classify_phrases() {
        assert_eq!(classify_citizenship("MALAYSIAN").as_deref(), Some("Malaysia"));
        assert_eq!(classify_citizenship("Citizen of the United States.").as_deref(), Some("United States"));
        assert_eq!(classify_citizenship("NZL").as_deref(), Some("New Zealand"));
        assert_eq!(classify_citizenship("Frenchtown resident"), None);
        assert_eq!(classify_citizenship("unknown"), None);
    }
}
