pub mod archiver;
pub mod backend;
pub mod build;
pub mod path;

pub use archiver::{Archiver, RunReport};
pub use path::DirPath;
