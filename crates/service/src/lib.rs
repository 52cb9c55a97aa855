//! Operation surface of the stock engine for transports.
//!
//! `app` decodes requests, calls the engine and encodes replies as JSON. It
//! knows nothing about the transport carrying them; `main.rs` wires it to
//! JSON lines on stdin/stdout.

pub mod app;

pub use app::dto::Request;
pub use app::errors::ServiceError;
pub use app::StockService;
