//! Console-based mail sender for development

use super::MailSender;

/// Mail sender that logs to console (for development)
pub struct ConsoleMailSender;

impl ConsoleMailSender {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleMailSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MailSender for ConsoleMailSender {
    fn send_reset(&self, email: &str, reset_link: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  PASSWORD RESET FOR: {}", email);
        println!("  LINK: {}", reset_link);
        println!("========================================");
        println!();

        tracing::info!(email = %email, "Password reset link sent");

        Ok(())
    }
}
