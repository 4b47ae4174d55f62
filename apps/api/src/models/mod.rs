pub mod email;
pub mod license;
pub mod profile;
pub mod resume;
