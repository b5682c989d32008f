//! Effect handler implementations (§4.5 ambient addition): the
//! log-capturing handler used by tests, and the loader's own handler that
//! intercepts `load:`/`log:` effects.

pub mod loader_handler;
pub mod log_handler;

pub use loader_handler::LoaderHandler;
pub use log_handler::LogCapture;
