// OCR confusion repair for machine-readable lines.
//
// The MRZ filler `<` is routinely read as K, L or C, and digits in date
// fields come back as look-alike letters.

use crate::models::countries::is_known_code;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    /// Letter -> digit substitutions applied inside numeric MRZ fields.
    pub static ref DIGIT_CONFUSIONS: HashMap<char, char> = {
        let mut m = HashMap::new();
        m.insert('g', '9');
        m.insert('q', '9');
        m.insert('B', '8');
        m.insert('G', '6');
        m.insert('S', '5');
        m.insert('l', '1');
        m.insert('I', '1');
        m.insert('O', '0');
        m.insert('o', '0');
        m
    };

    static ref PASSPORT_HEADER: Regex = Regex::new(r"P[<KLC]([A-Z<]{3})").unwrap();
    static ref FILLER_RUN_BETWEEN: Regex = Regex::new(r"([A-Z0-9])[KLC]{2,}([A-Z0-9])").unwrap();
    static ref FILLER_SINGLE_BETWEEN: Regex = Regex::new(r"([A-Z0-9])[KLC]([A-Z0-9])").unwrap();
    static ref TRAILING_FILLERS: Regex = Regex::new(r"[KLC<]{2,}$").unwrap();
    static ref LEADING_FILLER: Regex = Regex::new(r"^[KLC]([A-Z])").unwrap();
}

/// Replace every `PK`/`PL`/`PC` with `P<`.
pub fn normalize_p_markers(text: &str) -> String {
    text.replace("PK", "P<").replace("PL", "P<").replace("PC", "P<")
}

/// Locate the document header (`P<` or a misread of it followed by the
/// three-character country code) and return `(country_code, remainder)`.
/// Only the header itself is normalized so names containing "PL" survive.
pub fn split_passport_header(line: &str) -> Option<(String, String)> {
    let upper = line.to_uppercase();
    let headers: Vec<_> = PASSPORT_HEADER
        .captures_iter(&upper)
        .filter_map(|caps| caps.get(1))
        .collect();
    let code = headers
        .iter()
        .find(|m| is_known_code(m.as_str()))
        .or_else(|| headers.first())?;
    Some((code.as_str().to_string(), upper[code.end()..].to_string()))
}

/// Restore `<` fillers that OCR read as K, L or C in an MRZ name portion.
///
/// Trailing `<` padding is dropped first. The letter repair only runs when
/// no `<` survives inside the name, the signature of a line whose fillers
/// were all misread; a line with real separators is returned as is.
pub fn repair_name_fillers(portion: &str) -> String {
    let trimmed = portion.trim().trim_end_matches('<');
    if trimmed.contains('<') {
        return trimmed.to_string();
    }

    let repaired = TRAILING_FILLERS.replace(trimmed, "").to_string();
    let repaired = LEADING_FILLER.replace(&repaired, "<$1").to_string();
    let repaired = FILLER_RUN_BETWEEN.replace_all(&repaired, "$1<<$2").to_string();
    // Overlapping matches (A K B K C) need a second pass.
    let mut repaired = repaired;
    loop {
        let next = FILLER_SINGLE_BETWEEN.replace_all(&repaired, "$1<$2").to_string();
        if next == repaired {
            break;
        }
        repaired = next;
    }
    repaired
}

/// Replace letter look-alikes with the digits they stand for.
pub fn repair_digits(text: &str) -> String {
    text.chars()
        .map(|c| *DIGIT_CONFUSIONS.get(&c).unwrap_or(&c))
        .collect()
}

fn is_digitish(c: char) -> bool {
    c.is_ascii_digit() || DIGIT_CONFUSIONS.contains_key(&c)
}

/// First window of six digit-like characters (at least four of them real
/// digits), repaired to plain digits.
pub fn find_digit_run(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 6 {
        return None;
    }
    for window in chars.windows(6) {
        let digits = window.iter().filter(|c| c.is_ascii_digit()).count();
        if digits >= 4 && window.iter().all(|c| is_digitish(*c)) {
            let run: String = window.iter().collect();
            return Some(repair_digits(&run));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_split() {
        let (code, rest) = split_passport_header("P<MYSDOE<<JOHN<<<<").unwrap();
        assert_eq!(code, "MYS");
        assert_eq!(rest, "DOE<<JOHN<<<<");

        let (code, rest) = split_passport_header("PKUSASMITH<<ANNA").unwrap();
        assert_eq!(code, "USA");
        assert_eq!(rest, "SMITH<<ANNA");

        assert!(split_passport_header("PASSPORT NUMBER").is_none());

        let (code, _) = split_passport_header("PLACE P<GBRJONES<<TOM").unwrap();
        assert_eq!(code, "GBR");
    }

    #[test]
    fn test_intact_name_is_untouched() {
        assert_eq!(repair_name_fillers("DOE<<JOHN<BIN<ABDULLAH<<<<<<"), "DOE<<JOHN<BIN<ABDULLAH");
        assert_eq!(repair_name_fillers("MUHAMMAD<ALI<BIN<ABU<BAKAR<<<"), "MUHAMMAD<ALI<BIN<ABU<BAKAR");
    }

    #[test]
    fn test_misread_fillers_are_restored() {
        assert_eq!(repair_name_fillers("SMITHKKANNAKMARIEKKKKKK"), "SMITH<<ANNA<MARIE");
        assert_eq!(repair_name_fillers("TANLLWEIKMING"), "TAN<<WEI<MING");
    }

    #[test]
    fn test_digit_repair() {
        assert_eq!(repair_digits("9OO5I4"), "900514");
        assert_eq!(repair_digits("85O7S3"), "850753");
        assert_eq!(repair_digits("g2B1G0"), "928160");
    }

    #[test]
    fn test_find_digit_run() {
        assert_eq!(find_digit_run("DOE<<JOHN<<9005I4<<").as_deref(), Some("900514"));
        assert_eq!(find_digit_run("BOSS<<GIGI"), None);
        assert_eq!(find_digit_run("12"), None);
    }
}
