pub mod export;
pub mod help;
pub mod serve;
