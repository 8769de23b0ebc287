//! Equipment assignment types.
//!
//! The UI uses two placeholder identifiers for drop targets that are not real
//! collaborators: `"unassigned"` and `"virtual-primary"`. Those strings must
//! never be written to the store as a collaborator id; `CollaboratorRef`
//! absorbs them at the deserialization boundary so the persistence layer only
//! ever sees `Option<Uuid>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{Collaborator, EquipmentLine};

/// UI placeholder for the synthetic unassigned group.
pub const UNASSIGNED_SENTINEL: &str = "unassigned";
/// UI placeholder for the implicit primary-collaborator target.
pub const VIRTUAL_PRIMARY_SENTINEL: &str = "virtual-primary";
/// Shown in the audit trail when the collaborator row no longer exists.
pub const DELETED_COLLABORATOR_PLACEHOLDER: &str = "Former collaborator";

/// Collaborator reference as presented at the API boundary.
///
/// Deserializes `null`, the empty string and both UI sentinels to `None`;
/// anything else must parse as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollaboratorRef(pub Option<Uuid>);

impl<'de> Deserialize<'de> for CollaboratorRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        match value.as_deref() {
            None | Some("") | Some(UNASSIGNED_SENTINEL) | Some(VIRTUAL_PRIMARY_SENTINEL) => {
                Ok(CollaboratorRef(None))
            }
            Some(raw) => Uuid::parse_str(raw)
                .map(|id| CollaboratorRef(Some(id)))
                .map_err(|_| {
                    serde::de::Error::custom(format!("invalid collaborator id: {}", raw))
                }),
        }
    }
}

/// One row of the assignment audit trail.
///
/// `collaborator_id = NULL` records an unassignment. `collaborator_name` is
/// joined at read time and is absent when the collaborator has been deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssignmentRecord {
    pub history_id: Uuid,
    pub equipment_id: Uuid,
    pub parent_type: String,
    pub collaborator_id: Option<Uuid>,
    pub collaborator_name: Option<String>,
    pub assigned_by: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl AssignmentRecord {
    /// Display name for the audit trail, substituting a placeholder when the
    /// collaborator row has been deleted since the assignment.
    pub fn display_name(&self) -> &str {
        match (&self.collaborator_id, &self.collaborator_name) {
            (Some(_), Some(name)) => name,
            (Some(_), None) => DELETED_COLLABORATOR_PLACEHOLDER,
            (None, _) => UNASSIGNED_SENTINEL,
        }
    }
}

/// Equipment lines grouped under one collaborator, or under the synthetic
/// unassigned group (`collaborator_id = None`).
#[derive(Debug, Clone, Serialize)]
pub struct CollaboratorGroup {
    pub collaborator_id: Option<Uuid>,
    pub collaborator_name: String,
    pub is_primary: bool,
    pub equipment: Vec<EquipmentLine>,
}

/// Groups equipment lines by collaborator.
///
/// Collaborators are ordered primary-first, then by name. The unassigned
/// group is always appended, even when empty, so the UI always has a drop
/// target; lines referencing no known collaborator fall into it.
pub fn group_equipment(
    collaborators: &[Collaborator],
    equipment: Vec<EquipmentLine>,
) -> Vec<CollaboratorGroup> {
    let mut ordered: Vec<&Collaborator> = collaborators.iter().collect();
    ordered.sort_by(|a, b| {
        b.is_primary
            .cmp(&a.is_primary)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut groups: Vec<CollaboratorGroup> = ordered
        .iter()
        .map(|collaborator| CollaboratorGroup {
            collaborator_id: Some(collaborator.collaborator_id),
            collaborator_name: collaborator.name.clone(),
            is_primary: collaborator.is_primary,
            equipment: Vec::new(),
        })
        .collect();

    let mut unassigned = CollaboratorGroup {
        collaborator_id: None,
        collaborator_name: "Unassigned".to_string(),
        is_primary: false,
        equipment: Vec::new(),
    };

    for line in equipment {
        let target = line.collaborator_id.and_then(|id| {
            groups
                .iter_mut()
                .find(|group| group.collaborator_id == Some(id))
        });
        match target {
            Some(group) => group.equipment.push(line),
            None => unassigned.equipment.push(line),
        }
    }

    groups.push(unassigned);
    groups
}
