#![forbid(unsafe_code)]

pub mod common;
pub mod firewall;
pub mod ingress;
pub mod permission;
