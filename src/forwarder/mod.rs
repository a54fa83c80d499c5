pub mod forwarder;
pub mod request;
pub mod response;
