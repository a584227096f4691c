pub mod http;
pub mod validation;
