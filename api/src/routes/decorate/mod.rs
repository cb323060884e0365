pub mod decorate_request;
pub mod decorate_route;
