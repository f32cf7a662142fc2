//! Request handling: the transport-independent API surface.

mod handler;
mod health;
mod response;

pub use handler::RequestHandler;
pub use health::{HealthReport, API_VERSION};
pub use response::{ApiResponse, ErrorClass, ErrorResponse, Operation};
