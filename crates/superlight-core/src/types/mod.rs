pub mod beacon;
pub mod hex_serde;
