//! Saved postal addresses and the per-user address book.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopdesk_core::AddressId;

/// Errors raised by [`AddressBook`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressBookError {
    /// A new address is missing one of its required fields.
    #[error("All address fields are required (label, street, city, state, zipCode, country)")]
    MissingFields,

    /// No address with the given ID exists in the book.
    #[error("Address not found")]
    NotFound,
}

/// A saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: AddressId,
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Address fields as submitted by a client.
///
/// Used both for creation (where the six postal fields are required) and
/// for partial updates (where absent or blank fields keep their value).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub label: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub is_default: Option<bool>,
}

/// Returns the trimmed value when it is present and non-blank.
fn filled(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

impl AddressInput {
    fn into_address(self, id: AddressId) -> Result<Address, AddressBookError> {
        let required = |v: Option<&String>| filled(v).ok_or(AddressBookError::MissingFields);

        Ok(Address {
            id,
            label: required(self.label.as_ref())?,
            street: required(self.street.as_ref())?,
            city: required(self.city.as_ref())?,
            state: required(self.state.as_ref())?,
            zip_code: required(self.zip_code.as_ref())?,
            country: required(self.country.as_ref())?,
            phone: self.phone.map(|p| p.trim().to_owned()).unwrap_or_default(),
            is_default: self.is_default.unwrap_or(false),
        })
    }

    fn apply_to(self, address: &mut Address) {
        let slots = [
            (self.label.as_ref(), &mut address.label),
            (self.street.as_ref(), &mut address.street),
            (self.city.as_ref(), &mut address.city),
            (self.state.as_ref(), &mut address.state),
            (self.zip_code.as_ref(), &mut address.zip_code),
            (self.country.as_ref(), &mut address.country),
        ];
        for (value, slot) in slots {
            if let Some(value) = filled(value) {
                *slot = value;
            }
        }
        // Phone may be cleared explicitly.
        if let Some(phone) = self.phone {
            address.phone = phone.trim().to_owned();
        }
        if let Some(is_default) = self.is_default {
            address.is_default = is_default;
        }
    }
}

/// A user's saved addresses.
///
/// At most one address is ever marked default. Every mutating method clears
/// the flag on the other entries before setting it on one, so a book that
/// satisfies the invariant before a call satisfies it after.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook(Vec<Address>);

impl AddressBook {
    /// All addresses in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Address] {
        &self.0
    }

    /// The default address, if one is set.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.0.iter().find(|a| a.is_default)
    }

    /// Look up an address by ID.
    #[must_use]
    pub fn get(&self, id: AddressId) -> Option<&Address> {
        self.0.iter().find(|a| a.id == id)
    }

    /// Add an address.
    ///
    /// The first address in an empty book becomes the default. An address
    /// submitted with `isDefault: true` replaces the current default.
    ///
    /// # Errors
    ///
    /// Returns `AddressBookError::MissingFields` if a required field is blank.
    pub fn add(&mut self, input: AddressInput) -> Result<&Address, AddressBookError> {
        let mut address = input.into_address(AddressId::generate())?;
        if self.0.is_empty() {
            address.is_default = true;
        }
        if address.is_default {
            self.clear_default();
        }
        self.0.push(address);
        self.0.last().ok_or(AddressBookError::NotFound)
    }

    /// Apply a partial update to an address.
    ///
    /// # Errors
    ///
    /// Returns `AddressBookError::NotFound` if no address has this ID.
    pub fn update(&mut self, id: AddressId, input: AddressInput) -> Result<&Address, AddressBookError> {
        let index = self.position(id)?;
        if input.is_default == Some(true) {
            self.clear_default();
        }
        let address = self.0.get_mut(index).ok_or(AddressBookError::NotFound)?;
        input.apply_to(address);
        Ok(address)
    }

    /// Remove an address.
    ///
    /// Removing the default promotes the first remaining address.
    ///
    /// # Errors
    ///
    /// Returns `AddressBookError::NotFound` if no address has this ID.
    pub fn remove(&mut self, id: AddressId) -> Result<Address, AddressBookError> {
        let index = self.position(id)?;
        let removed = self.0.remove(index);
        if removed.is_default
            && let Some(first) = self.0.first_mut()
        {
            first.is_default = true;
        }
        Ok(removed)
    }

    /// Make an address the default.
    ///
    /// # Errors
    ///
    /// Returns `AddressBookError::NotFound` if no address has this ID.
    pub fn set_default(&mut self, id: AddressId) -> Result<(), AddressBookError> {
        let index = self.position(id)?;
        self.clear_default();
        if let Some(address) = self.0.get_mut(index) {
            address.is_default = true;
        }
        Ok(())
    }

    fn position(&self, id: AddressId) -> Result<usize, AddressBookError> {
        self.0
            .iter()
            .position(|a| a.id == id)
            .ok_or(AddressBookError::NotFound)
    }

    fn clear_default(&mut self) {
        for address in &mut self.0 {
            address.is_default = false;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn input(label: &str) -> AddressInput {
        AddressInput {
            label: Some(label.to_owned()),
            street: Some("1 Main St".to_owned()),
            city: Some("Springfield".to_owned()),
            state: Some("IL".to_owned()),
            zip_code: Some("62701".to_owned()),
            country: Some("US".to_owned()),
            phone: None,
            is_default: None,
        }
    }

    fn default_count(book: &AddressBook) -> usize {
        book.as_slice().iter().filter(|a| a.is_default).count()
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut book = AddressBook::default();
        let id = book.add(input("Home")).unwrap().id;
        assert_eq!(book.default_address().unwrap().id, id);
    }

    #[test]
    fn test_second_address_is_not_default_unless_asked() {
        let mut book = AddressBook::default();
        let home = book.add(input("Home")).unwrap().id;
        book.add(input("Work")).unwrap();
        assert_eq!(book.default_address().unwrap().id, home);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_add_with_default_replaces_existing_default() {
        let mut book = AddressBook::default();
        book.add(input("Home")).unwrap();
        let work = book
            .add(AddressInput {
                is_default: Some(true),
                ..input("Work")
            })
            .unwrap()
            .id;
        assert_eq!(book.default_address().unwrap().id, work);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_add_requires_postal_fields() {
        let mut book = AddressBook::default();
        let err = book
            .add(AddressInput {
                city: Some("   ".to_owned()),
                ..input("Home")
            })
            .unwrap_err();
        assert_eq!(err, AddressBookError::MissingFields);
        assert!(book.as_slice().is_empty());
    }

    #[test]
    fn test_update_keeps_blank_fields() {
        let mut book = AddressBook::default();
        let id = book.add(input("Home")).unwrap().id;
        let updated = book
            .update(
                id,
                AddressInput {
                    city: Some("Shelbyville".to_owned()),
                    street: Some(String::new()),
                    ..AddressInput::default()
                },
            )
            .unwrap();
        assert_eq!(updated.city, "Shelbyville");
        assert_eq!(updated.street, "1 Main St");
    }

    #[test]
    fn test_update_to_default_clears_others() {
        let mut book = AddressBook::default();
        book.add(input("Home")).unwrap();
        let work = book.add(input("Work")).unwrap().id;
        book.update(
            work,
            AddressInput {
                is_default: Some(true),
                ..AddressInput::default()
            },
        )
        .unwrap();
        assert_eq!(book.default_address().unwrap().id, work);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_update_unknown_address() {
        let mut book = AddressBook::default();
        let err = book
            .update(AddressId::generate(), AddressInput::default())
            .unwrap_err();
        assert_eq!(err, AddressBookError::NotFound);
    }

    #[test]
    fn test_remove_default_promotes_first_remaining() {
        let mut book = AddressBook::default();
        let home = book.add(input("Home")).unwrap().id;
        let work = book.add(input("Work")).unwrap().id;
        book.add(input("Cabin")).unwrap();

        book.remove(home).unwrap();
        assert_eq!(book.default_address().unwrap().id, work);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_remove_last_address_leaves_empty_book() {
        let mut book = AddressBook::default();
        let home = book.add(input("Home")).unwrap().id;
        book.remove(home).unwrap();
        assert!(book.default_address().is_none());
    }

    #[test]
    fn test_set_default_moves_flag() {
        let mut book = AddressBook::default();
        book.add(input("Home")).unwrap();
        let work = book.add(input("Work")).unwrap().id;
        book.set_default(work).unwrap();
        assert_eq!(book.default_address().unwrap().id, work);
        assert_eq!(default_count(&book), 1);
        assert_eq!(
            book.set_default(AddressId::generate()),
            Err(AddressBookError::NotFound)
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut book = AddressBook::default();
        book.add(input("Home")).unwrap();
        let json = serde_json::to_value(&book).unwrap();
        let first = &json[0];
        assert_eq!(first["zipCode"], "62701");
        assert_eq!(first["isDefault"], true);
        assert!(first["_id"].is_string());
    }
}
