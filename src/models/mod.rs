//! Store entities and their on-disk record layouts.

mod discount;
mod notification;
mod product;
mod sale;
mod user;
mod wishlist;

pub use discount::{Discount, DiscountType};
pub use notification::{Notification, NotificationKind, Recipient};
pub use product::{Product, ProductDraft, ProductKind};
pub use sale::{Sale, SaleItem, STATUS_COMPLETED};
pub use user::{CustomerProfile, Role, User, UserKind};
pub use wishlist::WishlistItem;
