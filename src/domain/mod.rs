pub mod classification;
pub mod stats;
pub mod ticket;
