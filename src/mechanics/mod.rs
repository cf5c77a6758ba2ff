pub mod odds;
pub mod rate;
pub mod stoch;

pub use odds::*;
pub use rate::*;
pub use stoch::*;
