//! Balanced n-ary hash commitments with compact inclusion proofs.

pub mod proof;
pub mod tree;

pub use proof::*;
pub use tree::*;
