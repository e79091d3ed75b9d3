//! Business event identifiers webhooks can subscribe to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// Raised when a string does not name a known event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// Declares the event enum together with its wire name and the permission
/// the platform table requires for it.
macro_rules! event_types {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, $perm:expr; )+) => {
        /// A business event, or the `Any` wildcard a subscription can use to
        /// receive every event.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum EventType {
            $(
                $(#[$meta])*
                #[serde(rename = $name)]
                $variant,
            )+
        }

        impl EventType {
            /// Every event type, wildcard included.
            pub const ALL: &'static [EventType] = &[$(EventType::$variant),+];

            /// Wire identifier, e.g. `order_created`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(EventType::$variant => $name,)+
                }
            }

            /// Permission the platform table requires for this event.
            pub(crate) fn default_permission(&self) -> Option<Permission> {
                match self {
                    $(EventType::$variant => $perm,)+
                }
            }
        }

        impl FromStr for EventType {
            type Err = UnknownEventType;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(EventType::$variant),)+
                    other => Err(UnknownEventType(other.to_string())),
                }
            }
        }
    };
}

event_types! {
    /// Wildcard: a subscription to `Any` matches every event.
    Any => "any", None;

    OrderCreated => "order_created", Some(Permission::ManageOrders);
    OrderConfirmed => "order_confirmed", Some(Permission::ManageOrders);
    OrderFullyPaid => "order_fully_paid", Some(Permission::ManageOrders);
    OrderUpdated => "order_updated", Some(Permission::ManageOrders);
    OrderCancelled => "order_cancelled", Some(Permission::ManageOrders);
    OrderFulfilled => "order_fulfilled", Some(Permission::ManageOrders);

    DraftOrderCreated => "draft_order_created", Some(Permission::ManageOrders);
    DraftOrderUpdated => "draft_order_updated", Some(Permission::ManageOrders);
    DraftOrderDeleted => "draft_order_deleted", Some(Permission::ManageOrders);

    FulfillmentCreated => "fulfillment_created", Some(Permission::ManageOrders);
    FulfillmentCanceled => "fulfillment_canceled", Some(Permission::ManageOrders);

    InvoiceRequested => "invoice_requested", Some(Permission::ManageOrders);
    InvoiceDeleted => "invoice_deleted", Some(Permission::ManageOrders);
    InvoiceSent => "invoice_sent", Some(Permission::ManageOrders);

    CustomerCreated => "customer_created", Some(Permission::ManageUsers);
    CustomerUpdated => "customer_updated", Some(Permission::ManageUsers);

    ProductCreated => "product_created", Some(Permission::ManageProducts);
    ProductUpdated => "product_updated", Some(Permission::ManageProducts);
    ProductDeleted => "product_deleted", Some(Permission::ManageProducts);
    ProductVariantCreated => "product_variant_created", Some(Permission::ManageProducts);
    ProductVariantUpdated => "product_variant_updated", Some(Permission::ManageProducts);
    ProductVariantDeleted => "product_variant_deleted", Some(Permission::ManageProducts);
    ProductVariantOutOfStock => "product_variant_out_of_stock", Some(Permission::ManageProducts);
    ProductVariantBackInStock => "product_variant_back_in_stock", Some(Permission::ManageProducts);

    CheckoutCreated => "checkout_created", Some(Permission::ManageCheckouts);
    CheckoutUpdated => "checkout_updated", Some(Permission::ManageCheckouts);

    PageCreated => "page_created", Some(Permission::ManagePages);
    PageUpdated => "page_updated", Some(Permission::ManagePages);
    PageDeleted => "page_deleted", Some(Permission::ManagePages);

    NotifyUser => "notify_user", Some(Permission::ManageUsers);
}

impl EventType {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, EventType::Any)
    }

    /// True when a subscription row for `self` delivers `event`.
    pub fn matches(&self, event: EventType) -> bool {
        *self == event || self.is_wildcard()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
