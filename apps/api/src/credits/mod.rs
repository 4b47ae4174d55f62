// Credit metering: balances, deductions for paid AI operations, grants from
// purchases and license redemptions.

pub mod cache;
pub mod handlers;
pub mod ledger;
pub mod products;
