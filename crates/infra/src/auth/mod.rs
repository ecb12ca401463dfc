//! Authorization server adapters

pub mod exchanger;

pub use exchanger::HttpTokenExchanger;
