//! Core types, services and trait definitions for Schola, a school
//! management backend.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::SchoolStore`]; mail, session and image collaborators
//! implement the traits in [`ports`].

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures instead.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod error;
pub mod exam;
pub mod login;
pub mod mail;
pub mod password;
pub mod people;
pub mod ports;
pub mod store;
pub mod students;
pub mod teachers;

pub use error::{Error, Result};
