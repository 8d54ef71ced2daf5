pub use client::*;

mod client;
mod models;
