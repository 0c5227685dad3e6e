pub mod annotations_request;
pub mod annotations_response;
pub mod annotations_route;
