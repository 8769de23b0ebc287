//! HTTP handlers for offer-service.
//!
//! All operations are scoped to the company from the request context.

pub mod assignments;
pub mod clients;
pub mod collaborators;
pub mod contracts;
pub mod equipment;
pub mod offers;
pub mod wizard;
