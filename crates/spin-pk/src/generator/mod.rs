mod backoff;
mod config;
mod distributed;
mod status;

pub use backoff::*;
pub use config::*;
pub use distributed::*;
pub use status::*;
