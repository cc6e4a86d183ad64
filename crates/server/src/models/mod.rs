//! Domain models for the store.
//!
//! Models are plain data plus the pure rules that keep them consistent
//! (address aliases, the single-default address book, cart keys, product
//! availability). Persistence lives in [`crate::db`].

pub mod address;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod order;
pub mod product;
pub mod user;

pub use address::{Address, AddressBook, AddressBookError, AddressInput};
pub use cart::Cart;
pub use catalog::{Brand, Category};
pub use contact::ContactMessage;
pub use order::{Order, OrderItem, ShippingAddress};
pub use product::{Product, StockSnapshot};
pub use user::{CurrentUser, User};
