pub mod audit_repo;
pub mod chat_session_repo;
pub mod client_repo;
pub mod exception_repo;
pub mod professional_repo;
pub mod reservation_link_repo;
pub mod reservation_repo;
pub mod service_repo;
pub mod slot_repo;

pub use audit_repo::*;
pub use chat_session_repo::*;
pub use client_repo::*;
pub use exception_repo::*;
pub use professional_repo::*;
pub use reservation_link_repo::*;
pub use reservation_repo::*;
pub use service_repo::*;
pub use slot_repo::*;
