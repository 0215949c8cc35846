mod check;
mod resolve;

pub use check::CheckCommand;
pub use resolve::ResolveCommand;
