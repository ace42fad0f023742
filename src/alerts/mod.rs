pub mod email;
pub mod evaluate;

pub use email::{Mailer, SmtpMailer};
pub use evaluate::{Alert, Direction, Metric, evaluate};
