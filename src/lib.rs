pub mod backend;
pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;
