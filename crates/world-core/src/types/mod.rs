//! Core type definitions

mod joint;
mod pose;
mod rigid_body;

pub use joint::*;
pub use pose::*;
pub use rigid_body::*;
