//! Domain documents stored by the backend

pub mod lenient;
pub mod menu_item;
pub mod order;

pub use menu_item::MenuItem;
pub use order::{MenuItemSnapshot, Order, OrderStatus};
