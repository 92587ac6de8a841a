//! Request extractors.

pub mod if_match;
pub mod json_body;
pub use if_match::IfMatch;
pub use json_body::JsonBody;
