//! Checkout composition
//!
//! Validates the customer form, computes the bill (fixed 5% tax, flat
//! delivery charge) and produces the outbound handoff. Two submission
//! flows share this path: the WhatsApp deep-link redirect and the payment
//! gateway redirect-back. The cart is cleared only after a handoff is
//! initiated or confirmed - a failed submission preserves it for retry.

mod geo;
mod message;

pub use geo::{AddressProvider, GeoError, GeoPoint, autofill_address};
pub use message::{compose_invoice, tel_link, whatsapp_link};

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::cart::{CartStore, CartStoreError};
use shared::order::DeliveryType;

/// Fixed tax rate applied at checkout (5%).
const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// Flat delivery charge in currency units.
const DELIVERY_CHARGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Customer contact and delivery fields collected at checkout.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CheckoutForm {
    #[validate(length(min = 2, message = "name must be at least 2 characters"))]
    pub customer_name: String,
    pub customer_phone: String,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutForm {
    /// Field rules plus the cross-field rules the derive cannot express:
    /// the phone must carry at least 10 digits, and delivery orders need
    /// an address.
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let digits = self
            .customer_phone
            .chars()
            .filter(|c| c.is_ascii_digit())
            .count();
        if digits < 10 {
            errors.add(
                "customer_phone",
                ValidationError::new("phone")
                    .with_message("phone must contain at least 10 digits".into()),
            );
        }

        if self.delivery_type == DeliveryType::Delivery
            && self.address.as_deref().is_none_or(|a| a.trim().is_empty())
        {
            errors.add(
                "address",
                ValidationError::new("address")
                    .with_message("address is required for delivery orders".into()),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Bill summary computed from the cart subtotal. All amounts rounded to
/// 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charges {
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_charge: f64,
    pub total: f64,
}

impl Charges {
    /// `tax = subtotal x 0.05`; flat 50 delivery charge for delivery
    /// orders, none for dine-in; `total = subtotal + tax + delivery`.
    pub fn compute(subtotal: f64, delivery_type: DeliveryType) -> Self {
        let subtotal = Decimal::from_f64(subtotal).unwrap_or_default().round_dp(2);
        let tax = (subtotal * TAX_RATE).round_dp(2);
        let delivery_charge = match delivery_type {
            DeliveryType::Delivery => DELIVERY_CHARGE,
            DeliveryType::DineIn => Decimal::ZERO,
        };
        let total = subtotal + tax + delivery_charge;

        Self {
            subtotal: subtotal.to_f64().unwrap_or(0.0),
            tax: tax.to_f64().unwrap_or(0.0),
            delivery_charge: delivery_charge.to_f64().unwrap_or(0.0),
            total: total.to_f64().unwrap_or(0.0),
        }
    }
}

/// Outcome of the payment gateway redirect-back, parsed from the return
/// URL's query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReturn {
    Success { order_id: String },
    Failure { message: String },
}

impl GatewayReturn {
    /// Parse `status`/`orderId`/`message` query pairs. Returns `None` when
    /// the query does not describe a gateway return at all.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<Self> {
        let mut status = None;
        let mut order_id = None;
        let mut msg = None;
        for (name, value) in pairs {
            match name {
                "status" => status = Some(value.to_string()),
                "orderId" => order_id = Some(value.to_string()),
                "message" => msg = Some(value.to_string()),
                _ => {}
            }
        }
        match status.as_deref() {
            Some("success") => Some(GatewayReturn::Success {
                order_id: order_id?,
            }),
            Some("failure") => Some(GatewayReturn::Failure {
                message: msg.unwrap_or_else(|| "payment failed".to_string()),
            }),
            _ => None,
        }
    }

    /// Parse a full redirect-back URL.
    pub fn from_url(url: &reqwest::Url) -> Option<Self> {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// How a composed order leaves the client. Both variants go through the
/// same validation and charge computation.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Deep link carrying the pre-formatted order summary. Fire-and-forget;
    /// no server persistence happens on this path.
    WhatsappRedirect { link: reqwest::Url, charges: Charges },
    /// Result of the gateway redirect-back flow.
    GatewayReturn(GatewayReturn),
}

impl Submission {
    /// Whether the external handoff was initiated/confirmed. Only then may
    /// the cart be cleared.
    pub fn settled(&self) -> bool {
        match self {
            Submission::WhatsappRedirect { .. } => true,
            Submission::GatewayReturn(GatewayReturn::Success { .. }) => true,
            Submission::GatewayReturn(GatewayReturn::Failure { .. }) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid checkout form: {0}")]
    Invalid(#[source] ValidationErrors),

    #[error("failed to build messaging link: {0}")]
    Link(String),

    #[error("cart error: {0}")]
    Cart(#[from] CartStoreError),
}

/// Validate the form against the current cart and compose the WhatsApp
/// handoff. The cart itself is untouched here; call [`finalize`] once the
/// link has actually been opened.
pub fn compose_whatsapp(
    cart: &CartStore,
    form: &CheckoutForm,
    destination: &str,
) -> Result<Submission, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    form.validate_all().map_err(CheckoutError::Invalid)?;

    let charges = Charges::compute(cart.subtotal(), form.delivery_type);
    let text = compose_invoice(cart.lines(), form, &charges);
    let link = whatsapp_link(destination, &text)?;
    Ok(Submission::WhatsappRedirect { link, charges })
}

/// Clear the cart after a settled handoff. Returns whether the submission
/// settled; a failed one leaves the cart intact so the customer can retry
/// without rebuilding the order.
pub fn finalize(cart: &mut CartStore, submission: &Submission) -> Result<bool, CheckoutError> {
    if submission.settled() {
        cart.clear()?;
        Ok(true)
    } else {
        Ok(false)
    }
}
