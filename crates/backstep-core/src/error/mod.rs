//! Error conversion helpers shared by the crate's modules.
//!
//! The crate's concrete error types live next to the code that produces them
//! ([`RetryError`](crate::retry::RetryError),
//! [`ConfigError`](crate::retry::ConfigError),
//! [`CodecError`](crate::codec::CodecError)). This module only holds the
//! [`error_boundary!`](crate::error_boundary) macro used to wire them together.

mod boundary;
