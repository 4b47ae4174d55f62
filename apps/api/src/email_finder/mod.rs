// Email finder: company → domain → naming pattern → guessed address,
// with Postgres as a read-through cache in front of Hunter.

pub mod handlers;
pub mod hunter;
pub mod names;
pub mod resolver;
