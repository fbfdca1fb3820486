pub mod activity;
pub mod artifact;
pub mod client;
pub mod data_source;
pub mod instance_store;

pub use activity::*;
pub use artifact::*;
pub use client::*;
pub use data_source::*;
pub use instance_store::*;
