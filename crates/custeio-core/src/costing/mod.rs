pub mod engine;
pub mod outcome;

pub use engine::{compute_recipe_cost, fetch_line_ingredients};
pub use outcome::{LineCost, LineStatus, RecipeCost};
