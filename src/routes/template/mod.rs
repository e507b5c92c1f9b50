mod add;
mod get;

pub use add::*;
pub use get::*;
