//! Equipment line model.
//!
//! A line belongs to either an offer or a contract; the two live in separate
//! tables (`offer_equipment`, `contract_equipment`) and queries expose the
//! owner as `parent_type` + `parent_id`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Which table an equipment line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentType {
    Offer,
    Contract,
}

impl ParentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentType::Offer => "offer",
            ParentType::Contract => "contract",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "contract" => ParentType::Contract,
            _ => ParentType::Offer,
        }
    }
}

/// Where a line is delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    MainClient,
    Collaborator,
    PredefinedSite,
    SpecificAddress,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryType::MainClient => "main_client",
            DeliveryType::Collaborator => "collaborator",
            DeliveryType::PredefinedSite => "predefined_site",
            DeliveryType::SpecificAddress => "specific_address",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "collaborator" => DeliveryType::Collaborator,
            "predefined_site" => DeliveryType::PredefinedSite,
            "specific_address" => DeliveryType::SpecificAddress,
            _ => DeliveryType::MainClient,
        }
    }
}

/// One leased item (or item group) within an offer or contract.
///
/// `monthly_payment_total` is the payment for the whole line, quantity
/// included; the aggregator sums it without re-multiplying. `attributes` and
/// `specifications` are open-ended key/value maps whose key order is
/// user-defined and must survive storage, hence `IndexMap` in a `json` column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EquipmentLine {
    pub equipment_id: Uuid,
    pub parent_id: Uuid,
    pub parent_type: String,
    pub title: String,
    pub purchase_price: Decimal,
    pub quantity: i32,
    pub margin_percent: Decimal,
    pub monthly_payment_total: Decimal,
    pub serial_number: Option<String>,
    pub attributes: Json<IndexMap<String, String>>,
    pub specifications: Json<IndexMap<String, String>>,
    pub delivery_type: String,
    pub delivery_collaborator_id: Option<Uuid>,
    pub delivery_site_id: Option<Uuid>,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_postal_code: Option<String>,
    pub delivery_country: Option<String>,
    pub delivery_contact_name: Option<String>,
    pub delivery_contact_email: Option<String>,
    pub collaborator_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating an equipment line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEquipmentLine {
    pub title: String,
    pub purchase_price: Decimal,
    pub quantity: i32,
    pub margin_percent: Decimal,
    pub monthly_payment_total: Decimal,
    pub serial_number: Option<String>,
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
    #[serde(default)]
    pub specifications: IndexMap<String, String>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub delivery_collaborator_id: Option<Uuid>,
    pub delivery_site_id: Option<Uuid>,
    pub delivery_address: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_postal_code: Option<String>,
    pub delivery_country: Option<String>,
    pub delivery_contact_name: Option<String>,
    pub delivery_contact_email: Option<String>,
}

impl Default for CreateEquipmentLine {
    fn default() -> Self {
        CreateEquipmentLine {
            title: String::new(),
            purchase_price: Decimal::ZERO,
            quantity: 1,
            margin_percent: Decimal::ZERO,
            monthly_payment_total: Decimal::ZERO,
            serial_number: None,
            attributes: IndexMap::new(),
            specifications: IndexMap::new(),
            delivery_type: DeliveryType::MainClient,
            delivery_collaborator_id: None,
            delivery_site_id: None,
            delivery_address: None,
            delivery_city: None,
            delivery_postal_code: None,
            delivery_country: None,
            delivery_contact_name: None,
            delivery_contact_email: None,
        }
    }
}

impl CreateEquipmentLine {
    /// Checks the conditionally-required delivery fields for the chosen
    /// delivery type. Returns the name of the first missing field.
    pub fn missing_delivery_field(&self) -> Option<&'static str> {
        match self.delivery_type {
            DeliveryType::MainClient => None,
            DeliveryType::Collaborator => {
                if self.delivery_collaborator_id.is_none() {
                    Some("delivery_collaborator_id")
                } else {
                    None
                }
            }
            DeliveryType::PredefinedSite => {
                if self.delivery_site_id.is_none() {
                    Some("delivery_site_id")
                } else {
                    None
                }
            }
            DeliveryType::SpecificAddress => {
                for (field, value) in [
                    ("delivery_address", &self.delivery_address),
                    ("delivery_city", &self.delivery_city),
                    ("delivery_postal_code", &self.delivery_postal_code),
                    ("delivery_country", &self.delivery_country),
                    ("delivery_contact_name", &self.delivery_contact_name),
                    ("delivery_contact_email", &self.delivery_contact_email),
                ] {
                    if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                        return Some(field);
                    }
                }
                None
            }
        }
    }
}

/// Input for updating an equipment line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEquipmentLine {
    pub title: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub margin_percent: Option<Decimal>,
    pub monthly_payment_total: Option<Decimal>,
    pub serial_number: Option<String>,
    pub attributes: Option<IndexMap<String, String>>,
    pub specifications: Option<IndexMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_delivery(delivery_type: DeliveryType) -> CreateEquipmentLine {
        CreateEquipmentLine {
            title: "MacBook Pro 14".to_string(),
            purchase_price: Decimal::new(1500, 0),
            quantity: 1,
            margin_percent: Decimal::new(10, 0),
            monthly_payment_total: Decimal::new(4950, 2),
            delivery_type,
            ..CreateEquipmentLine::default()
        }
    }

    #[test]
    fn main_client_delivery_needs_no_extra_fields() {
        assert_eq!(
            line_with_delivery(DeliveryType::MainClient).missing_delivery_field(),
            None
        );
    }

    #[test]
    fn collaborator_delivery_requires_the_collaborator() {
        let mut line = line_with_delivery(DeliveryType::Collaborator);
        assert_eq!(
            line.missing_delivery_field(),
            Some("delivery_collaborator_id")
        );

        line.delivery_collaborator_id = Some(Uuid::new_v4());
        assert_eq!(line.missing_delivery_field(), None);
    }

    #[test]
    fn specific_address_requires_the_full_address_and_contact() {
        let mut line = line_with_delivery(DeliveryType::SpecificAddress);
        assert_eq!(line.missing_delivery_field(), Some("delivery_address"));

        line.delivery_address = Some("12 Rue de la Loi".to_string());
        line.delivery_city = Some("Bruxelles".to_string());
        line.delivery_postal_code = Some("1000".to_string());
        line.delivery_country = Some("BE".to_string());
        line.delivery_contact_name = Some("Marie Dupont".to_string());
        assert_eq!(
            line.missing_delivery_field(),
            Some("delivery_contact_email")
        );

        line.delivery_contact_email = Some("marie@example.com".to_string());
        assert_eq!(line.missing_delivery_field(), None);
    }

    #[test]
    fn blank_address_fields_count_as_missing() {
        let mut line = line_with_delivery(DeliveryType::SpecificAddress);
        line.delivery_address = Some("   ".to_string());
        assert_eq!(line.missing_delivery_field(), Some("delivery_address"));
    }

    #[test]
    fn attribute_maps_round_trip_through_json_in_order() {
        let mut line = line_with_delivery(DeliveryType::MainClient);
        line.attributes.insert("Couleur".to_string(), "Gris".to_string());
        line.attributes.insert("Taille".to_string(), "14\"".to_string());
        line.specifications
            .insert("RAM".to_string(), "32 Go".to_string());
        line.specifications
            .insert("Stockage".to_string(), "1 To".to_string());

        let json = serde_json::to_string(&line).unwrap();
        let parsed: CreateEquipmentLine = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.attributes, line.attributes);
        assert_eq!(parsed.specifications, line.specifications);
        let keys: Vec<&String> = parsed.attributes.keys().collect();
        assert_eq!(keys, ["Couleur", "Taille"]);
    }
}
