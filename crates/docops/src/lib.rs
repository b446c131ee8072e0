//! Document transforms and the scoped temp workspace.
//!
//! Everything here is synchronous and file/byte oriented; callers on the
//! async side wrap these in `spawn_blocking`. PDF page manipulation is done
//! with lopdf, image decoding with the image crate, Word output with docx-rs.

pub mod error;
pub mod pdf;
pub mod text;
pub mod word;
pub mod workspace;

pub use {
    error::{Error, Result},
    workspace::Workspace,
};
