pub use crate::app::App;
pub use animequote_types::error::{ClResult, Error};
pub use animequote_types::types::Timestamp;

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
