pub mod filters;
pub mod trade;
