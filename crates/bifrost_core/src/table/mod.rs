//! # Tables
//!
//! Dense attribute columns and the generic table that keeps them in lockstep
//! with a UID generator and a change set.

mod column;
mod entity_table;

pub use column::Column;
pub use entity_table::{Columns, EntityTable};
