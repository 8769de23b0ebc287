//! HTTP request handlers.

pub mod company;
pub mod packs;
pub mod products;
pub mod taxonomy;
