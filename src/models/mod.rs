pub mod communication;
pub mod document;
pub mod enums;

pub use communication::*;
pub use document::*;
pub use enums::*;
