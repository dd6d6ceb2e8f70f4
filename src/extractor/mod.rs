pub mod description;
pub mod listing;

pub use description::extract_description;
pub use listing::ListingExtractor;
