pub mod events;
pub mod fanout;
pub mod server;
pub mod session;
