pub mod identity;
pub use identity::*;

pub mod server;
pub use server::*;

pub mod session;
pub use session::*;
