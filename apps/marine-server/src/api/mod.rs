pub mod actions;
pub mod catalog;
pub mod dashboard;
pub mod db;
pub mod meta;
pub mod observations;
pub mod search;
pub mod tables;
pub mod ui;
