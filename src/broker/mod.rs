pub mod token_broker;
pub mod upstream;
