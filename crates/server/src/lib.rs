//! Service mode: upload a PDF, get back a summary as JSON or as a text file.

pub mod api;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
