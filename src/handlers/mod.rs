//! HTTP route handlers

pub mod assets;
pub mod page;
pub mod session;
pub mod styles;
