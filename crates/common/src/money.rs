//! Price rendering as shown on product cards

/// Literal prefix the storefront puts in front of every price
pub const CURRENCY_PREFIX: &str = "MYR";

/// Render a price the way the listing view does: `MYR` followed by the amount with
/// exactly two decimals and no thousands separator.
pub fn format_price(price: f64) -> String {
    format!("{}{:.2}", CURRENCY_PREFIX, price)
}

/// Parse a price typed into a form field. Returns `None` for anything the UI should
/// reject as "Product Price is invalid".
pub fn parse_price_input(input: &str) -> Option<f64> {
    let value: f64 = input.trim().parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}
