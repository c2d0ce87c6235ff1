use reqwest::Url;

use crate::db::models::Product;

/// `wa.me` chat link for the configured number, prefilled with an enquiry
/// about `product`. `None` when the number has no digits.
pub fn whatsapp_link(number: &str, product: &Product) -> Option<String> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let message = format!(
        "Hello, I'm interested in {} (₦{}). Is it available?",
        product.name,
        format_price(product.price)
    );
    let base = format!("https://wa.me/{digits}");
    Url::parse_with_params(&base, &[("text", message)])
        .ok()
        .map(String::from)
}

/// Whole amounts drop the decimals and get thousands separators.
fn format_price(price: f64) -> String {
    if price.fract() != 0.0 {
        return format!("{price:.2}");
    }
    let whole = format!("{}", price as i64);
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
