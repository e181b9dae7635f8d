// Start of file: /src/api/mod.rs

/*
    * HTTP surface of the service, one sub-module per route group.
*/

pub mod greeting;

// End of file: /src/api/mod.rs
