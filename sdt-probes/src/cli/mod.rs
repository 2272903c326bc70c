pub mod args;

pub use args::{Args, Command, DumpArgs, EncodeArgs};
