//! Crate-wide macros.

mod deserialization;
