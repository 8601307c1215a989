pub mod mailer;
pub mod whatsapp;

pub use mailer::HttpMailer;
pub use whatsapp::WhatsAppClient;
