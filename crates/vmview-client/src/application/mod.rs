//! Application layer: the per-connection session and its collaborators.
//!
//! Everything here is synchronous.  The infrastructure driver task feeds the
//! [`session::Session`] one inbound frame or one UI command at a time, so no
//! state in this layer is ever shared between tasks.

pub mod events;
pub mod frame;
pub mod session;
