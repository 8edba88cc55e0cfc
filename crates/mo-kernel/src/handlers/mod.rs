//! Phase handlers
//!
//! One handler per [`Phase`](mo_spec::Phase) variant:
//! - [`execute_orchestration_operation`]: `MOOperation` against the
//!   orchestration service
//! - [`execute_client_operation`]: `clientOperation` against the provisioned
//!   deployment

mod client;
mod orchestration;

pub use client::execute_client_operation;
pub use orchestration::execute_orchestration_operation;
