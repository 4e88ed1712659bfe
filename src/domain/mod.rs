mod parse;
mod scrollback;
mod types;

pub use parse::*;
pub use scrollback::*;
pub use types::*;
