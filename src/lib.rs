pub mod boundary;
pub mod checkpoint;
pub mod core;
pub mod driver;
pub mod frontier;
pub mod solver;
pub mod utils;

pub mod prelude {
    pub use crate::boundary::*;
    pub use crate::checkpoint::*;
    pub use crate::core::*;
    pub use crate::driver::*;
    pub use crate::frontier::*;
    pub use crate::solver::*;
    pub use crate::utils::prelude::*;
}
