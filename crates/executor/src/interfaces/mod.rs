mod args;
mod interpreter;
mod outcome;
mod settlement;
mod transaction;

pub use args::*;
pub use interpreter::*;
pub use outcome::*;
pub use settlement::*;
pub use transaction::*;
