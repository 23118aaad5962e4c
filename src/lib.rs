pub mod analytics;
pub mod external;
pub mod flow;
pub mod man;
pub mod result;
pub mod web;
