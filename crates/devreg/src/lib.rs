//! Top-level facade crate for devreg.
//!
//! Re-exports the domain types and the server library so users can depend on a single crate.

pub mod core {
    pub use devreg_core::*;
}

pub mod server {
    pub use devreg_server::*;
}
