pub mod cli;
pub mod compiler;
pub mod config;
pub mod crc;
pub mod giver;
pub mod item;
pub mod protocol;
pub mod tvm;
pub mod utils;
