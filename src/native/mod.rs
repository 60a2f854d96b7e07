//! Native side of the boundary
//!
//! Architecture:
//! - `types.rs` - C element types (`NativeType`, `NativeElement`)
//! - `alloc.rs` - pluggable allocators, including the tracking double
//! - `buffer.rs` - `NativeBuffer` and its `FillGuard`
//! - `string.rs` - owned NUL-terminated strings
//! - `list.rs` - singly-linked string lists

mod alloc;
mod buffer;
mod list;
mod string;
mod types;

#[cfg(test)]
mod tests;

pub use alloc::{NativeAllocator, SystemAllocator, TrackingAllocator};
pub use buffer::{FillGuard, NativeBuffer};
pub use list::{Iter as StringListIter, SListNode, StringList};
pub use string::NativeStr;
pub use types::{GBoolean, NativeElement, NativeType, OwnedCStr};
