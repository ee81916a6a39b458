//! Cosmetic item catalog and the set of items the user owns.

mod catalog;
mod owned;

pub use catalog::{items_in_category, shop_item, ItemCategory, ShopItem, SHOP_ITEMS};
pub use owned::{ShopLedger, ShopState, SHOP_KEY};
