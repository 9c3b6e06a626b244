//! Schema and field type system
//!
//! This module defines the mapping registry data for one index:
//! - Field types (Keyword, Text)
//! - Field mappings and the ordered index mapping
//! - Unmapped-field behavior

mod field_type;
mod mapping;

pub use field_type::FieldType;
pub use mapping::{DynamicMapping, FieldMapping, IndexMapping};
