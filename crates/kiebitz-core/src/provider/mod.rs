//! Provider onboarding, mediator confirmation and discovery.

pub mod requests;
pub mod service;

pub use requests::{ConfirmProviderData, StoreProviderData};
pub use service::ProviderService;
