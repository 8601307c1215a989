mod audit;
mod chat;
mod client;
mod professional;
mod reservation;
mod service;
mod slot;

pub use audit::*;
pub use chat::*;
pub use client::*;
pub use professional::*;
pub use reservation::*;
pub use service::*;
pub use slot::*;
