pub mod enums;
pub mod measurement;
pub mod range;
pub mod report;
pub mod token;

pub use enums::*;
pub use measurement::*;
pub use range::*;
pub use report::*;
pub use token::*;
