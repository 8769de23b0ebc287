//! Data models for catalog-service.

pub mod company;
pub mod pack;
pub mod product;
pub mod taxonomy;

pub use company::{
    CatalogSettings, CategoryImpact, CompanyCustomizations, CompanyProfile, EnvironmentalReport,
};
pub use pack::{Pack, PackDetail, PackItem};
pub use product::{Product, ProductCo2, VariantPrice, CO2_SOURCE};
pub use taxonomy::{Brand, Category};
