//! Record storage
//!
//! A single in-memory store holds every table behind one lock. Reads go
//! through [`Collection`], which stays lazy until materialized.

pub mod collection;
pub mod in_memory;
pub mod tables;

pub use collection::{Collection, Comparator, Predicate};
pub use in_memory::LibraryStore;
pub use tables::{LibraryItem, Membership, Model, Tables};
