//! Grouped selections over a [`dom::NodeTree`], the keyed data join and the
//! attribute/text/structure operations that act on its results.
//!
//! Selections are plain values: they never borrow the tree. Operations go
//! through [`Scene`], which owns the tree and the node → datum bindings, and
//! reject selections that reference detached nodes.

mod bindings;
mod error;
mod join;
mod scene;
mod selection;
mod value;

pub use crate::bindings::DatumTable;
pub use crate::error::{SelectionError, SelectionResult};
pub use crate::join::{GroupJoin, Join, KeyFn, join_group};
pub use crate::scene::Scene;
pub use crate::selection::{EnterSlot, Group, Selection, Slot};
pub use crate::value::ValueSource;
