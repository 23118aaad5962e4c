pub mod context;
pub mod dto;
pub mod executor;
pub mod facade;
pub mod step;
