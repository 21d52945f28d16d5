pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reviews;
pub mod revoked_tokens;
pub mod roles;
pub mod shipping_addresses;
pub mod user_roles;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use revoked_tokens::Entity as RevokedTokens;
pub use roles::Entity as Roles;
pub use shipping_addresses::Entity as ShippingAddresses;
pub use user_roles::Entity as UserRoles;
pub use users::Entity as Users;
