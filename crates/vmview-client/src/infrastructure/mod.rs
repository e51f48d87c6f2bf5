//! Infrastructure layer: everything that touches the network, the runtime or
//! the file system.

pub mod client;
pub mod discovery;
pub mod display;
pub mod storage;
pub mod transport;
