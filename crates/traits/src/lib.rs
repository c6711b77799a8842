//! Seams between the rendering engine and its environment.
//!
//! Templates, fonts and other assets are reached through a [`ResourceProvider`];
//! batch work is fanned out through an [`Executor`].

pub mod executor;
pub mod resource;

pub use executor::{Executor, SyncExecutor};
pub use resource::{InMemoryResourceProvider, ResourceError, ResourceProvider, SharedResourceData};
