//! Request-side services shared by the route groups.

mod validation;
pub use validation::{AttributeRule, AttributeRules};
