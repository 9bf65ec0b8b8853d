pub mod log_mailer;
pub mod smtp;
pub mod template;

pub use log_mailer::LogMailer;
pub use smtp::SmtpMailer;
pub use template::load_reset_template;
