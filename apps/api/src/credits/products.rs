//! Fixed mapping from Gumroad products to the credits they grant.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Custom permalink shown in the store, e.g. `pack-booster`.
    pub permalink: &'static str,
    /// Short permalink Gumroad assigns to the product.
    pub short_code: &'static str,
    pub credits: i32,
}

pub const PRODUCTS: &[Product] = &[
    Product {
        permalink: "pack-booster",
        short_code: "ezocca",
        credits: 20,
    },
    Product {
        permalink: "career-coach",
        short_code: "kyhjbx",
        credits: 100,
    },
];

/// Looks a product up by either of its permalinks (case-insensitive).
pub fn find_product(identifier: &str) -> Option<&'static Product> {
    let identifier = identifier.trim();
    PRODUCTS.iter().find(|p| {
        p.permalink.eq_ignore_ascii_case(identifier) || p.short_code.eq_ignore_ascii_case(identifier)
    })
}
