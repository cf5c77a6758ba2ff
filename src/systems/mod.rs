pub mod draw;
pub mod plan;
pub mod pool;
pub mod rarity;
