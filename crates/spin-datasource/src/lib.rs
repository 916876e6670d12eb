//! Nested datasource switching for synchronous, thread-per-request services.
//!
//! A [`DynamicDatasourceContextHolder`] keeps a per-thread stack of
//! [`CurrentDatasourceInfo`] entries. The top of the stack is the datasource
//! (and optionally catalog) every connection acquired on that thread is routed
//! to; an empty stack means the primary datasource. Scopes nest: a service on
//! `db1` may call one on `db2`, which may call back into `db1`, and each exit
//! restores the caller's selection.
//!
//! [`RoutingDataSource`] consults the holder on every connection acquisition,
//! reuses connections already bound to the current distributed transaction,
//! and applies the selected catalog.
//!
//! ```
//! use spin_datasource::{DatasourceTopology, DynamicDatasourceContextHolder};
//!
//! let holder = DynamicDatasourceContextHolder::new(DatasourceTopology::default());
//! {
//!     let _orders = holder.enter("orders").unwrap();
//!     assert_eq!(holder.peek().unwrap().datasource(), "orders");
//!     {
//!         let _audit = holder.enter("audit").unwrap();
//!         assert_eq!(holder.peek().unwrap().datasource(), "audit");
//!     }
//!     assert_eq!(holder.peek().unwrap().datasource(), "orders");
//! }
//! assert!(holder.peek().is_none());
//! ```

mod context;
mod error;
mod info;
mod routing;

pub use crate::context::*;
pub use crate::error::*;
pub use crate::info::*;
pub use crate::routing::*;
