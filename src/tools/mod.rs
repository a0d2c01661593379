pub mod download;
pub mod reload;
pub mod search;
pub mod stats;

pub use download::*;
pub use reload::*;
pub use search::*;
pub use stats::*;
