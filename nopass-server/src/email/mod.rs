//! Mail sending abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleMailSender;
pub use smtp::{SmtpConfig, SmtpMailSender};

/// Trait for sending transactional mail
pub trait MailSender: Send + Sync {
    /// Send a password-reset link to an address
    fn send_reset(&self, email: &str, reset_link: &str) -> Result<(), String>;
}

/// Allow using Box<dyn MailSender> as a MailSender
impl MailSender for Box<dyn MailSender> {
    fn send_reset(&self, email: &str, reset_link: &str) -> Result<(), String> {
        (**self).send_reset(email, reset_link)
    }
}
