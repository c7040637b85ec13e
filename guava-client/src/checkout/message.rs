//! Plain-text order summary and outbound deep links.
//!
//! The summary is deterministic: same cart, form and charges always yield
//! byte-identical text, so the handoff message can be tested and re-sent.

use std::fmt::Write;

use super::{Charges, CheckoutError, CheckoutForm};
use crate::cart::{CartLine, OptionValue};
use shared::order::DeliveryType;

/// Compose the human-readable order summary sent through the messaging
/// channel: customer block, itemized lines, bill summary, optional notes.
pub fn compose_invoice(lines: &[CartLine], form: &CheckoutForm, charges: &Charges) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "*NEW ORDER*");
    let _ = writeln!(out);
    let _ = writeln!(out, "Customer: {}", form.customer_name);
    let _ = writeln!(out, "Phone: {}", form.customer_phone);
    if let Some(email) = &form.email {
        let _ = writeln!(out, "Email: {}", email);
    }
    match form.delivery_type {
        DeliveryType::Delivery => {
            let _ = writeln!(out, "Type: Delivery");
            if let Some(address) = &form.address {
                let _ = writeln!(out, "Address: {}", address);
            }
        }
        DeliveryType::DineIn => {
            let _ = writeln!(out, "Type: Dine-in");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "*Items*");
    for line in lines {
        let _ = writeln!(
            out,
            "{} x{} - {:.2}",
            line.title,
            line.quantity,
            line.line_total()
        );
        // Canonical option order so the text is stable across pick order.
        for (name, value) in line.customization.sorted() {
            match value {
                OptionValue::Flag(on) => {
                    let _ = writeln!(out, "  - {}: {}", name, if *on { "yes" } else { "no" });
                }
                OptionValue::Text(text) => {
                    let _ = writeln!(out, "  - {}: {}", name, text);
                }
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "*Bill*");
    let _ = writeln!(out, "Subtotal: {:.2}", charges.subtotal);
    let _ = writeln!(out, "Tax (5%): {:.2}", charges.tax);
    if charges.delivery_charge > 0.0 {
        let _ = writeln!(out, "Delivery: {:.2}", charges.delivery_charge);
    }
    let _ = writeln!(out, "Total: {:.2}", charges.total);

    if let Some(notes) = form.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "Notes: {}", notes);
    }

    out
}

/// Deep link to the messaging service: `https://wa.me/<digits>?text=<...>`.
/// The query encoding is handled by the URL builder.
pub fn whatsapp_link(destination: &str, text: &str) -> Result<reqwest::Url, CheckoutError> {
    let digits: String = destination.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(CheckoutError::Link(format!(
            "destination {destination:?} has no digits"
        )));
    }
    reqwest::Url::parse_with_params(&format!("https://wa.me/{digits}"), [("text", text)])
        .map_err(|e| CheckoutError::Link(e.to_string()))
}

/// One-way `tel:` link for direct calling.
pub fn tel_link(phone: &str) -> String {
    let cleaned: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    format!("tel:{cleaned}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{CartItem, CartStore, Customization};

    fn sample() -> (CartStore, CheckoutForm, Charges) {
        let mut cart = CartStore::new();
        cart.add(
            &CartItem {
                item_id: "mango-lassi".to_string(),
                title: "Mango Lassi".to_string(),
                unit_price: 18.5,
                image_ref: None,
            },
            2,
            Some(Customization::new().flag("no-sugar", true)),
        )
        .unwrap();

        let form = CheckoutForm {
            customer_name: "Ana Flores".to_string(),
            customer_phone: "5551234567".to_string(),
            email: None,
            delivery_type: DeliveryType::Delivery,
            address: Some("12 Palm Street".to_string()),
            notes: Some("ring the bell".to_string()),
        };
        let charges = Charges::compute(cart.subtotal(), form.delivery_type);
        (cart, form, charges)
    }

    #[test]
    fn invoice_is_deterministic_and_complete() {
        let (cart, form, charges) = sample();
        let a = compose_invoice(cart.lines(), &form, &charges);
        let b = compose_invoice(cart.lines(), &form, &charges);
        assert_eq!(a, b);

        assert!(a.contains("Customer: Ana Flores"));
        assert!(a.contains("Address: 12 Palm Street"));
        assert!(a.contains("Mango Lassi x2 - 37.00"));
        assert!(a.contains("  - no-sugar: yes"));
        assert!(a.contains("Subtotal: 37.00"));
        assert!(a.contains("Tax (5%): 1.85"));
        assert!(a.contains("Delivery: 50.00"));
        assert!(a.contains("Total: 88.85"));
        assert!(a.contains("Notes: ring the bell"));
    }

    #[test]
    fn dine_in_invoice_omits_delivery_line() {
        let (cart, mut form, _) = sample();
        form.delivery_type = DeliveryType::DineIn;
        form.address = None;
        let charges = Charges::compute(cart.subtotal(), form.delivery_type);
        let text = compose_invoice(cart.lines(), &form, &charges);
        assert!(text.contains("Type: Dine-in"));
        assert!(!text.contains("Delivery:"));
    }

    #[test]
    fn whatsapp_link_encodes_text() {
        let link = whatsapp_link("+52 1 55 1234 5678", "order *1*\nline two").unwrap();
        assert_eq!(link.host_str(), Some("wa.me"));
        assert_eq!(link.path(), "/5215512345678");
        let query = link.query().unwrap();
        assert!(query.starts_with("text="));
        assert!(!query.contains('\n'));

        assert!(whatsapp_link("no digits here", "x").is_err());
    }

    #[test]
    fn tel_link_strips_whitespace() {
        assert_eq!(tel_link("+52 55 1234 5678"), "tel:+525512345678");
    }
}
