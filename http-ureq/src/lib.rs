#![deny(unsafe_code)]

//! Ureq-backed transport for the reqpool request layer.
//!
//! [`Client`] implements [`reqpool_http::HttpCaller`] over a [`ureq::Agent`],
//! honoring the request's cancellation token before the call starts and
//! while the request body is being sent.

mod client;

pub use client::Client;

pub use reqpool_http as http;
