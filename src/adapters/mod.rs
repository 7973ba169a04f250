pub mod aws;
pub mod output;
pub mod service;
pub mod settings;
