mod holder;
mod interceptor;
mod scope;
mod stack;
mod transaction;

pub use holder::*;
pub use interceptor::*;
pub use scope::*;
pub use transaction::*;
