pub mod error;
pub mod watchlist;
