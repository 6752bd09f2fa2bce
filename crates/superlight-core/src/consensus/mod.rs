pub mod sync_committee;

pub use sync_committee::*;
