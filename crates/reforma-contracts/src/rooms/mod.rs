mod category;
mod verdict;

pub use category::{ImageRef, RoomCategory};
pub use verdict::{RenovationNeed, RoomVerdict, UNKNOWN_TEXT};
