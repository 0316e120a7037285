pub mod assembler;
pub mod candidates;
pub mod knapsack;
pub mod outfit;
pub mod planner;
pub mod providers;

pub use outfit::{AssemblySettings, OutfitService};
