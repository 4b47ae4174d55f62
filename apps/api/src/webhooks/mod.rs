// Gumroad integration: sale pings credit the buyer, license keys can be
// redeemed once for the product's credits.

pub mod gumroad;
pub mod license;
pub mod payment;
