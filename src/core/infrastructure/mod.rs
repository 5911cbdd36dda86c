pub mod connection;
pub mod shell;
