//! Offer PDF rendering for the leasing platform.
//!
//! Builds offer documents procedurally with a fixed layout: branded header,
//! issuer and client blocks, equipment table, totals and conditions. There is
//! no template engine; the layout lives in [`pdf`].

pub mod config;
pub mod handlers;
pub mod models;
pub mod pdf;
pub mod services;
pub mod startup;
