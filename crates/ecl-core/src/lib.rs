pub mod common;
pub mod deck;
pub mod domain;
pub mod ecl_file;
pub mod schedule;
pub mod schema;
pub mod summary;
pub mod tables;
pub mod units;
