pub mod classify;
pub mod ticket;
