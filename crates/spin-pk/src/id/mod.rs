mod distributed;
mod meta;

pub use distributed::*;
pub use meta::*;
