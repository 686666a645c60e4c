pub mod forecast;
pub mod preprocessing;
