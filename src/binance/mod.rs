//! Binance module - Client implementation for the Binance spot REST API

pub mod auth;
pub mod messages;
pub mod rest;

pub use rest::BinanceClient;
