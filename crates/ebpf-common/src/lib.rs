#![cfg_attr(not(feature = "std"), no_std)]

pub mod configuration;
pub mod cookie_tag;
pub mod data_saver;
pub mod ingress_discard;
pub mod permission;
pub mod pin_paths;
pub mod uid_owner;
