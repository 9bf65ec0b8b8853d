pub mod error;
pub mod mail;
pub mod model;
pub mod ports;
pub mod repo;
pub mod secrets;
pub mod service;
pub mod username;
pub mod validation;
