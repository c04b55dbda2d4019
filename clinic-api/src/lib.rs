mod client;
mod clinic_url;
pub mod domain;
mod dto;
mod error;

pub(crate) use clinic_url::*;

pub use client::*;
pub use domain::*;
pub use error::*;
