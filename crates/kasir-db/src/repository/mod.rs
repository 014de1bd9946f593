//! # Repository Layer
//!
//! One repository per aggregate. Repositories own the SQL; callers see
//! domain types from `kasir-core`.
//!
//! Multi-aggregate writes (the checkout transaction) live in
//! [`crate::checkout`], which composes the executor-generic primitives
//! exposed here (`adjust_stock`, `insert_sale`, `record_purchase`, ...)
//! inside one SQLite transaction.

pub mod category;
pub mod member;
pub mod product;
pub mod sale;
pub mod settings;
