//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod address;
pub mod admin_fcm_token;
pub mod admin_user;
pub mod category;
pub mod fcm_token;
pub mod notification;
pub mod order;
pub mod order_item;
pub mod order_status_history;
pub mod product;
pub mod product_category;
pub mod referral;
pub mod referral_referee;
pub mod setting;
pub mod user;

// Re-export specific types to avoid conflicts
pub use address::{Entity as Address, Model as AddressModel};
pub use admin_fcm_token::Entity as AdminFcmToken;
pub use admin_user::{Entity as AdminUser, Model as AdminUserModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use fcm_token::Entity as FcmToken;
pub use notification::{Entity as Notification, Model as NotificationModel};
pub use order::{Entity as Order, Model as OrderModel};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use order_status_history::Entity as OrderStatusHistory;
pub use product::{Entity as Product, Model as ProductModel};
pub use product_category::Entity as ProductCategory;
pub use referral::{Entity as Referral, Model as ReferralModel};
pub use referral_referee::Entity as ReferralReferee;
pub use setting::{Entity as Setting, Model as SettingModel};
pub use user::{Entity as User, Model as UserModel};
