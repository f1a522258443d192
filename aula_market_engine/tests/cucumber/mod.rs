pub mod market_world;
pub mod setups;
pub mod steps;

pub use market_world::MarketWorld;
