//! Database models split into separate files, one per aggregate.

pub mod household;
pub mod recipe;
pub mod shopping;
pub mod user;

pub use self::household::*;
pub use self::recipe::*;
pub use self::shopping::*;
pub use self::user::*;
