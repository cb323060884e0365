pub mod commit_status_request;
pub mod commit_status_route;
