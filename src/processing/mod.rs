pub mod dates;
pub mod extractors;
pub mod field_correction;
pub mod labels;
pub mod mrz;
pub mod normalizer;
pub mod patterns;
pub mod property;

pub use dates::DateResolver;
pub use extractors::IdentityLabelExtractor;
pub use labels::{find_by_label, find_by_labels, LabelMatch};
pub use mrz::MrzDecoder;
pub use normalizer::normalize;
pub use patterns::PatternSet;
pub use property::PropertyExtractor;
