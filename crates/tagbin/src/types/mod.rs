//! Runtime values the codec operates on.
//!
//! The [`Value`] enum is the closed set of shapes a descriptor can accept,
//! together with its supporting record, class-instance and typed-array types.

mod value;

pub use value::{Instance, Record, TypedArray, TypedArrayKind, Value};
