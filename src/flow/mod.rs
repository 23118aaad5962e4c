pub mod rt;
pub mod scenarios;
pub mod validation;
