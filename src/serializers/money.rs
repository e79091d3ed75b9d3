use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxedMoney {
    pub net: Money,
    pub gross: Money,
}

impl TaxedMoney {
    pub fn new(net: Money, gross: Money) -> Self {
        Self { net, gross }
    }
}

/// Minor units of an ISO 4217 currency.
pub fn currency_precision(currency: &str) -> u32 {
    match currency.to_ascii_uppercase().as_str() {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        _ => 2,
    }
}

/// Round half-up to the currency's minor units, keeping trailing zeros
/// (`10` in USD becomes `10.00`).
pub fn quantize_price(amount: Decimal, currency: &str) -> Decimal {
    let precision = currency_precision(currency);
    let mut rounded =
        amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    rounded
}

/// The amount shown as "the price": gross when prices include taxes, net otherwise.
pub fn get_base_price(price: &TaxedMoney, include_taxes_in_prices: bool) -> Decimal {
    if include_taxes_in_prices {
        price.gross.amount
    } else {
        price.net.amount
    }
}
