//! HTTP trigger surface: one endpoint per workflow plus the calendar
//! scans. Handlers stay thin; everything of substance lives in the
//! workflows.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::app_router;
pub use types::AppContext;
