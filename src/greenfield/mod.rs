#![deny(unreachable_pub)]
mod account;
mod any;
mod client;
mod eip712;
mod errors;
mod normalize;
mod registry;
mod sign;
mod types;
pub use account::*;
pub use any::*;
pub use client::*;
pub use eip712::*;
pub use errors::*;
pub use normalize::*;
pub use registry::*;
pub use sign::*;
pub use types::*;
