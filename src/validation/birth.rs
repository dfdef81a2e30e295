use chrono::{Datelike, NaiveDate};
use log::trace;
use crate::models::ExtractionRules;

/// Completed years between `dob` and `today`, one less when today's
/// month/day falls before the birthday.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

pub struct BirthDateValidator;

impl BirthDateValidator {
    /// Whether a birth year lies in `(min_birth_year, current_year]`.
    pub fn year_in_range(year: i32, rules: &ExtractionRules) -> bool {
        year > rules.min_birth_year && year <= rules.current_year()
    }

    /// Age for `dob` when both the year range and `[0, max_age)` hold.
    pub fn validate(dob: NaiveDate, rules: &ExtractionRules) -> Option<u32> {
        if !Self::year_in_range(dob.year(), rules) {
            trace!("Birth year {} outside accepted range", dob.year());
            return None;
        }
        let age = age_on(dob, rules.today());
        if age < 0 || age >= rules.max_age as i32 {
            trace!("Age {} outside accepted range", age);
            return None;
        }
        Some(age as u32)
    }
}
