//! Promotion rows, the eligibility predicate, and the CSV catalog importer.

pub mod catalog;
pub mod domain;
pub mod eligibility;

pub use catalog::{CatalogImportError, PromotionCatalog};
pub use domain::{Promotion, PromotionUsage, TargetAudience};
pub use eligibility::{EligibilityContext, EligibilityPolicy, IneligibilityReason};
