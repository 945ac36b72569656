//! Attribute (value-pair) types and ordered pair lists.

mod attribute;
mod list;
mod types;

pub use attribute::{Attribute, Value};
pub use list::PairList;
pub use types::AttributeType;
