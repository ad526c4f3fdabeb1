pub mod category;

pub use category::{CategoryLevel, Entity as Category, Model as CategoryModel};
