//! hostbridge
//!
//! Routes front-end queries to host-side handler operations and generates
//! typed TypeScript stubs for calling them.
#![deny(unsafe_code)]

pub mod core;
pub mod generation;
pub mod infrastructure;
pub mod routing;
