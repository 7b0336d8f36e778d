//! HTTP surface - router assembly and handlers

pub mod handlers;
pub mod routes;
