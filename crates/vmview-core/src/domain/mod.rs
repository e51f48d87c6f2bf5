//! Domain values shared between the codec and the client session.
//!
//! Everything here is a plain value: no I/O, no async, no interior
//! mutability.  Descriptors and users are handed to callers by value.

pub mod turn;
pub mod user;
pub mod vm;

pub use turn::{TurnState, TurnUpdate};
pub use user::{User, UserRank};
pub use vm::{EncodedImage, ImageFormat, VmDescriptor};
