pub mod errors;
pub mod db;
pub mod provider;
pub mod service;
