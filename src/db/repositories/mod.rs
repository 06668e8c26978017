pub mod players;
pub mod reports;
