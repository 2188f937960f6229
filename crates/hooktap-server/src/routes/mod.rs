//! HTTP route handlers.

pub mod download;
pub mod misc;
pub mod requests;
pub mod sample;
pub mod webhook;
pub mod ws;
