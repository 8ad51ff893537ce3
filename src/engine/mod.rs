//! Execution engine for provision
//!
//! The engine orchestrates:
//! 1. Planning - Validated descriptor in apply order
//! 2. Diffing - Current vs desired state, query only
//! 3. Executing - Apply changes one resource at a time, with progress

pub mod differ;
pub mod executor;
