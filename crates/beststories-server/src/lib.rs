//! Best stories HTTP server library (router, handlers, error mapping).

pub mod gateway;
