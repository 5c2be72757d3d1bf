pub mod blocked;
pub mod chain;
pub mod entity;
pub mod error;
pub mod replace;
