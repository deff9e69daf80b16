//! Route handlers.

pub mod api;
pub mod form;
pub mod health;
pub mod page;
