pub mod command;
pub mod responder;
pub mod session;
