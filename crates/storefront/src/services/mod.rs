//! Checkout services: order mail, payment QR codes and the notifier that
//! ties them together.

pub mod checkout;
pub mod email;
pub mod qr;

pub use checkout::{CheckoutError, CheckoutNotifier};
pub use email::{EmailError, MailAttachment, Mailer, OutgoingMail, SmtpMailer, is_deliverable};
pub use qr::{QrError, payment_qr_png};
