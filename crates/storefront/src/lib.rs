//! Paperback storefront library.
//!
//! The bookstore web application as a library, so the router, repositories,
//! and services can be exercised from tests and the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod state;
