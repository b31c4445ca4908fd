//! Static marketplace vocabulary: category codes and display formatting.

pub mod categories;
pub mod format;

pub use self::categories::*;
pub use self::format::*;
