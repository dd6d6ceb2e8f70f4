pub mod models;

pub use models::{Cookie, Extraction, JobRecord, RawCard, Verdict};
