pub mod assessment;
pub mod grid;
pub mod scenario;
pub mod weather;

pub use assessment::*;
pub use grid::*;
pub use scenario::*;
pub use weather::*;
