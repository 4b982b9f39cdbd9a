//! Storage and orchestration: invoice repository, reference-data stores,
//! and the update pipeline that ties matching and the lifecycle together.

pub mod pipeline;
pub mod projects;
pub mod repository;
pub mod sources;

pub use pipeline::{UpdateError, UpdateOutcome, UpdatePipeline};
pub use projects::{InMemoryProjectStore, Project, ProjectStore};
pub use repository::{InMemoryInvoiceRepository, InvoiceRepository, Versioned};
pub use sources::{InMemoryGoodsReceiptStore, InMemoryPurchaseOrderStore, InMemoryRateCardStore};
