//! HTTP request handlers.

pub mod mandates;
