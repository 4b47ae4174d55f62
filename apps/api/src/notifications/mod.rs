// Transactional email: fixed templates delivered through Resend.

pub mod handlers;
pub mod sender;
pub mod templates;
