pub mod actions;
pub mod api;
pub mod constants;
pub mod models;
