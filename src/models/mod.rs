pub mod booking;
pub mod enums;

pub use booking::*;
pub use enums::*;
