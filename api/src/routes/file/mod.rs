pub mod file_request;
pub mod file_route;
