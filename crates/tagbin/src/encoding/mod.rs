//! The descriptor contract and the byte cursors descriptors read and write
//! through.
//!
//! - [`Descriptor`]: the raw per-type operations every descriptor implements
//! - [`DescriptorExt`]: the checked operations derived from them
//! - [`ReadCursor`] / [`WriteCursor`]: little-endian primitives over a byte slice

mod cursor;
mod traits;


pub use cursor::{ReadCursor, WriteCursor};
pub use traits::{Descriptor, DescriptorExt, DescriptorRef, IntoDescriptor};
