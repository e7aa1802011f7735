pub mod org;
pub mod permission;
