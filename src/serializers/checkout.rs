use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::attributes::{serialize_attributes, AssignedAttribute};
use super::global_id::to_global_id;
use super::money::{get_base_price, quantize_price, TaxedMoney};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub charge_taxes: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub product_type_metadata: BTreeMap<String, String>,
}

impl fmt::Display for ProductInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantChannelListing {
    pub channel_id: String,
    /// Undiscounted listing price in the channel currency.
    pub price_amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    pub pk: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AssignedAttribute>,
    #[serde(default)]
    pub channel_listings: Vec<VariantChannelListing>,
}

impl VariantInfo {
    /// Name, else SKU, else `ID:<pk>`.
    pub fn label(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        match &self.sku {
            Some(sku) if !sku.is_empty() => sku.clone(),
            _ => format!("ID:{}", self.pk),
        }
    }

    /// `"Product (Variant)"` as shown to customers.
    pub fn display_product(&self, product: &ProductInfo) -> String {
        format!("{} ({})", product, self.label())
    }

    pub fn channel_listing(&self, channel_id: &str) -> Option<&VariantChannelListing> {
        self.channel_listings
            .iter()
            .find(|listing| listing.channel_id == channel_id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub pk: String,
    pub quantity: u32,
    pub unit_price: TaxedMoney,
    pub unit_price_with_discounts: TaxedMoney,
}

/// A checkout line with the variant and product it was fetched with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLineInfo {
    pub line: CheckoutLine,
    pub variant: VariantInfo,
    pub product: ProductInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInfo {
    pub channel_id: String,
    /// Checkout currency, used for quantizing amounts.
    pub currency: String,
    /// Currency code of the checkout's channel, reported in payloads.
    pub channel_currency_code: String,
}

fn amount(value: Decimal, currency: &str) -> Value {
    Value::String(quantize_price(value, currency).to_string())
}

/// Fields common to both line layouts, or `None` when the variant is not
/// listed in the checkout's channel.
fn base_line(checkout: &CheckoutInfo, info: &CheckoutLineInfo) -> Option<Map<String, Value>> {
    let listing = info.variant.channel_listing(&checkout.channel_id)?;
    let variant = &info.variant;
    let product = &info.product;

    let value = json!({
        "id": to_global_id("CheckoutLine", &info.line.pk),
        "sku": variant.sku,
        "quantity": info.line.quantity,
        "charge_taxes": product.charge_taxes,
        "base_price": amount(listing.price_amount, &checkout.currency),
        "currency": checkout.channel_currency_code,
        "full_name": variant.display_product(product),
        "product_name": product.name,
        "variant_name": variant.name,
        "attributes": serialize_attributes(&variant.attributes),
        "variant_id": to_global_id("ProductVariant", &variant.pk),
        "product_metadata": product.metadata,
        "product_type_metadata": product.product_type_metadata,
    });
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Lines with their calculated net and gross prices.
pub fn serialize_checkout_lines_with_taxes(
    checkout: &CheckoutInfo,
    lines: &[CheckoutLineInfo],
) -> Vec<Value> {
    lines
        .iter()
        .filter_map(|info| {
            let mut data = base_line(checkout, info)?;
            let line = &info.line;
            let currency = checkout.currency.as_str();
            data.insert(
                "price_net_amount".into(),
                amount(line.unit_price.net.amount, currency),
            );
            data.insert(
                "price_gross_amount".into(),
                amount(line.unit_price.gross.amount, currency),
            );
            data.insert(
                "price_with_discounts_net_amount".into(),
                amount(line.unit_price_with_discounts.net.amount, currency),
            );
            data.insert(
                "price_with_discounts_gross_amount".into(),
                amount(line.unit_price_with_discounts.gross.amount, currency),
            );
            Some(Value::Object(data))
        })
        .collect()
}

/// Lines carrying a single discounted base price, net or gross depending on
/// whether the shop shows prices with taxes.
pub fn serialize_checkout_lines_without_taxes(
    checkout: &CheckoutInfo,
    lines: &[CheckoutLineInfo],
    include_taxes_in_prices: bool,
) -> Vec<Value> {
    lines
        .iter()
        .filter_map(|info| {
            let mut data = base_line(checkout, info)?;
            let base = get_base_price(&info.line.unit_price_with_discounts, include_taxes_in_prices);
            data.insert(
                "base_price_with_discounts".into(),
                amount(base, &checkout.currency),
            );
            Some(Value::Object(data))
        })
        .collect()
}
