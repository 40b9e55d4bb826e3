pub mod client;
pub use client::*;

pub mod server;
pub use server::*;
