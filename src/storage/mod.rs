pub mod environment;
pub mod postman;
