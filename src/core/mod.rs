//! Core - the owning handle, kind resolution and host conversions

pub mod convert;
pub mod handle;
pub mod kind;

pub use handle::Handle;
pub use kind::Kind;

#[cfg(test)]
mod tests;
