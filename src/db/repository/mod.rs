pub mod household;
pub mod recipe;
pub mod shopping;
pub mod tag;
pub mod user;

pub use household::HouseholdRepository;
pub use recipe::RecipeRepository;
pub use shopping::ShoppingRepository;
pub use tag::TagRepository;
pub use user::UserRepository;
