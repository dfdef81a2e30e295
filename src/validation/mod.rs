pub mod birth;

pub use birth::{age_on, BirthDateValidator};
