pub mod cache;
pub mod config;
pub mod controller;
pub mod models;
pub mod providers;
pub mod selector;
pub mod session;
