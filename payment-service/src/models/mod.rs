//! Data models for payment-service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::direct_debit::Environment;

/// Request to set up a direct-debit mandate for a contract.
#[derive(Debug, Deserialize)]
pub struct CreateMandate {
    pub contract_id: Uuid,
}

/// Result of a mandate setup, echoing what was persisted on the contract
/// and the environment the sequence actually succeeded against.
#[derive(Debug, Serialize)]
pub struct MandateResult {
    pub contract_id: Uuid,
    pub customer_id: String,
    pub billing_request_id: String,
    pub flow_id: String,
    pub authorisation_url: String,
    pub environment: Environment,
}

/// Split a contact display name into given and family parts for the
/// provider's customer record. Single-word names are used for both.
pub fn split_name(name: &str) -> (String, String) {
    let trimmed = name.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((given, family)) => (given.to_string(), family.trim().to_string()),
        None => (trimmed.to_string(), trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_handles_the_plain_case() {
        assert_eq!(
            split_name("Marie Dupont"),
            ("Marie".to_string(), "Dupont".to_string())
        );
    }

    #[test]
    fn split_name_keeps_compound_family_names_together() {
        assert_eq!(
            split_name("Jean de la Fontaine"),
            ("Jean".to_string(), "de la Fontaine".to_string())
        );
    }

    #[test]
    fn split_name_duplicates_single_word_names() {
        assert_eq!(
            split_name("Prince"),
            ("Prince".to_string(), "Prince".to_string())
        );
    }

    #[test]
    fn split_name_trims_stray_whitespace() {
        assert_eq!(
            split_name("  Marie   Dupont  "),
            ("Marie".to_string(), "Dupont".to_string())
        );
    }
}
