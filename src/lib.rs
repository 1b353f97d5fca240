pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fieldmap;
pub mod generator;
pub mod layout;
pub mod output;
pub mod parse;
pub mod sidecar;
pub mod template;
