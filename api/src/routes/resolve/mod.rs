pub mod resolve_request;
pub mod resolve_route;
