//! HTTP handlers for the collection route groups.

pub mod collection;
