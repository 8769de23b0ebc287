//! Domain models for offer-service.

mod assignment;
mod client;
mod collaborator;
mod contract;
mod equipment;
mod offer;

pub use assignment::{
    group_equipment, AssignmentRecord, CollaboratorGroup, CollaboratorRef,
    DELETED_COLLABORATOR_PLACEHOLDER, UNASSIGNED_SENTINEL, VIRTUAL_PRIMARY_SENTINEL,
};
pub use client::{Client, CreateClient, UpdateClient};
pub use collaborator::{Collaborator, CreateCollaborator, UpdateCollaborator};
pub use contract::{Contract, ContractStatus, CreateContract, ListContractsFilter};
pub use equipment::{
    CreateEquipmentLine, DeliveryType, EquipmentLine, ParentType, UpdateEquipmentLine,
};
pub use offer::{
    CreateOffer, ListOffersFilter, Offer, OfferStatus, OfferType, OfferWithEquipment, UpdateOffer,
    WorkflowStatus,
};
