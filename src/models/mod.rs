pub mod affiliate;
pub mod cart;
pub mod click;
pub mod order;
pub mod product;
pub mod user;
pub mod withdrawal;

pub use affiliate::*;
pub use cart::*;
pub use click::*;
pub use order::*;
pub use product::*;
pub use user::*;
pub use withdrawal::*;
