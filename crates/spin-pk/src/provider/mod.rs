mod external;
mod interface;
mod ip;
mod kind;
mod property;

pub use external::*;
pub use interface::*;
pub use ip::*;
pub use kind::*;
pub use property::*;
