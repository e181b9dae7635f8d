// Start of file: /src/utils/mod.rs

/*
    * Cross-cutting HTTP plumbing: global error mapping and the error envelope.
*/

pub mod error_handler;
pub mod response_handler;

// End of file: /src/utils/mod.rs
