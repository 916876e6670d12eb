mod datasource;
mod dynamic;
mod group;
mod named;
mod registry;
#[cfg(test)]
mod tests;

pub use datasource::*;
pub use dynamic::*;
pub use group::*;
pub use named::*;
pub use registry::*;
