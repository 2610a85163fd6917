pub mod models;
pub mod scrapers;
pub mod table;
