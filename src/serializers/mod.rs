//! Flatten catalogue and checkout data into webhook JSON payloads.
//!
//! Prices arrive already calculated; these functions only pick, quantize and
//! lay out fields.

mod attributes;
mod checkout;
mod global_id;
mod money;

pub use attributes::{
    serialize_attributes, AssignedAttribute, Attribute, AttributeFile, AttributeInputType,
    AttributeValue,
};
pub use checkout::{
    serialize_checkout_lines_with_taxes, serialize_checkout_lines_without_taxes, CheckoutInfo,
    CheckoutLine, CheckoutLineInfo, ProductInfo, VariantChannelListing, VariantInfo,
};
pub use global_id::{from_global_id, to_global_id};
pub use money::{currency_precision, get_base_price, quantize_price, Money, TaxedMoney};
