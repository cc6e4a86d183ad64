//! Orders, their line-item snapshots, and shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shopdesk_core::{Money, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

/// Payment method recorded on every order (cash on delivery).
pub const DEFAULT_PAYMENT_METHOD: &str = "cod";

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub amount: Money,
    pub address: ShippingAddress,
    pub payment_method: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item frozen at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
}

impl OrderItem {
    /// Price times quantity, `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_line_total(self.quantity)
    }
}

/// Shipping address snapshot stored on an order. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

/// Canonical address fields, in the order they are validated and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    FirstName,
    LastName,
    Email,
    Street,
    City,
    State,
    Zipcode,
    Country,
    Phone,
}

impl AddressField {
    /// Every field, in reporting order.
    pub const ALL: [Self; 9] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Street,
        Self::City,
        Self::State,
        Self::Zipcode,
        Self::Country,
        Self::Phone,
    ];

    /// Canonical field name, as reported to clients.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Email => "email",
            Self::Street => "street",
            Self::City => "city",
            Self::State => "state",
            Self::Zipcode => "zipcode",
            Self::Country => "country",
            Self::Phone => "phone",
        }
    }

    /// Accepted input keys, most preferred first.
    const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::FirstName => &["firstName", "first_name"],
            Self::LastName => &["lastName", "last_name"],
            Self::Email => &["email"],
            Self::Street => &["street", "address"],
            Self::City => &["city"],
            Self::State => &["state", "province"],
            Self::Zipcode => &["zipcode", "zipCode", "zip_code", "postal_code"],
            Self::Country => &["country"],
            Self::Phone => &["phone", "phoneNumber"],
        }
    }
}

/// Address as submitted by a client, in any of the historical spellings.
///
/// Older clients send `zipCode`, `zip_code` or `postal_code` instead of
/// `zipcode`, a single `name` instead of first and last names, and so on.
/// [`RawAddress::normalize`] resolves all of them to a [`ShippingAddress`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawAddress(Map<String, Value>);

impl RawAddress {
    /// Resolve aliases and check that every field is present.
    ///
    /// # Errors
    ///
    /// Returns every missing field, in canonical order, when any is absent
    /// or blank after alias resolution.
    pub fn normalize(&self) -> Result<ShippingAddress, Vec<AddressField>> {
        let mut values = AddressField::ALL.map(|field| self.resolve(field));

        let missing: Vec<AddressField> = AddressField::ALL
            .iter()
            .zip(values.iter())
            .filter(|(_, value)| value.is_none())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(missing);
        }

        let mut take = |field: AddressField| {
            values
                .get_mut(field as usize)
                .and_then(Option::take)
                .unwrap_or_default()
        };

        Ok(ShippingAddress {
            first_name: take(AddressField::FirstName),
            last_name: take(AddressField::LastName),
            email: take(AddressField::Email),
            street: take(AddressField::Street),
            city: take(AddressField::City),
            state: take(AddressField::State),
            zipcode: take(AddressField::Zipcode),
            country: take(AddressField::Country),
            phone: take(AddressField::Phone),
        })
    }

    fn resolve(&self, field: AddressField) -> Option<String> {
        field
            .aliases()
            .iter()
            .find_map(|key| self.text(key))
            .or_else(|| self.split_full_name(field))
    }

    /// Split a combined `name` into first name and the remainder.
    fn split_full_name(&self, field: AddressField) -> Option<String> {
        let full = self.text("name")?;
        let mut parts = full.split_whitespace();
        let first = parts.next()?;
        match field {
            AddressField::FirstName => Some(first.to_owned()),
            AddressField::LastName => {
                let rest = parts.collect::<Vec<_>>().join(" ");
                (!rest.is_empty()).then_some(rest)
            }
            _ => None,
        }
    }

    /// Non-blank text under `key`; numbers are accepted (e.g. numeric zip codes).
    fn text(&self, key: &str) -> Option<String> {
        let text = match self.0.get(key)? {
            Value::String(s) => s.trim().to_owned(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> RawAddress {
        serde_json::from_value(value).unwrap()
    }

    fn complete() -> Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "street": "12 St James's Sq",
            "city": "London",
            "state": "London",
            "zipcode": "SW1Y 4JH",
            "country": "UK",
            "phone": "+44 20 7946 0000"
        })
    }

    #[test]
    fn test_normalize_canonical_fields() {
        let address = raw(complete()).normalize().unwrap();
        assert_eq!(address.first_name, "Ada");
        assert_eq!(address.zipcode, "SW1Y 4JH");
    }

    #[test]
    fn test_normalize_zip_aliases() {
        for key in ["zipCode", "zip_code", "postal_code"] {
            let mut value = complete();
            let map = value.as_object_mut().unwrap();
            map.remove("zipcode");
            map.insert(key.to_owned(), json!("90210"));
            let address = raw(value).normalize().unwrap();
            assert_eq!(address.zipcode, "90210", "alias {key}");
        }
    }

    #[test]
    fn test_normalize_numeric_zip() {
        let mut value = complete();
        value["zipcode"] = json!(90210);
        assert_eq!(raw(value).normalize().unwrap().zipcode, "90210");
    }

    #[test]
    fn test_normalize_snake_case_and_legacy_keys() {
        let address = raw(json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "email": "grace@example.com",
            "address": "1 Navy Way",
            "city": "Arlington",
            "province": "VA",
            "zip_code": "22201",
            "country": "US",
            "phoneNumber": "555-0100"
        }))
        .normalize()
        .unwrap();
        assert_eq!(address.street, "1 Navy Way");
        assert_eq!(address.state, "VA");
        assert_eq!(address.phone, "555-0100");
        assert_eq!(address.last_name, "Hopper");
    }

    #[test]
    fn test_normalize_splits_full_name() {
        let mut value = complete();
        let map = value.as_object_mut().unwrap();
        map.remove("firstName");
        map.remove("lastName");
        map.insert("name".to_owned(), json!("Mary Ann  Evans"));
        let address = raw(value).normalize().unwrap();
        assert_eq!(address.first_name, "Mary");
        assert_eq!(address.last_name, "Ann Evans");
    }

    #[test]
    fn test_single_word_name_has_no_last_name() {
        let mut value = complete();
        let map = value.as_object_mut().unwrap();
        map.remove("firstName");
        map.remove("lastName");
        map.insert("name".to_owned(), json!("Cher"));
        let missing = raw(value).normalize().unwrap_err();
        assert_eq!(missing, vec![AddressField::LastName]);
    }

    #[test]
    fn test_preferred_alias_wins() {
        let mut value = complete();
        value["zipCode"] = json!("00000");
        assert_eq!(raw(value).normalize().unwrap().zipcode, "SW1Y 4JH");
    }

    #[test]
    fn test_reports_every_missing_field_in_order() {
        let missing = raw(json!({ "email": "x@example.com", "city": "  " }))
            .normalize()
            .unwrap_err();
        let names: Vec<_> = missing.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            [
                "firstName", "lastName", "street", "city", "state", "zipcode", "country", "phone"
            ]
        );
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            product_id: ProductId::generate(),
            name: "Mug".to_owned(),
            price: serde_json::from_value(json!(4.5)).unwrap(),
            quantity: 3,
            image: String::new(),
        };
        assert_eq!(item.line_total().unwrap().to_string(), "13.50");
    }
}
