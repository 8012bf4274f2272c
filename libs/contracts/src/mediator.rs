//! Command/query dispatch.
//!
//! A request type names its response; a service implements [`Handler`] once per
//! request type it serves. Controllers build the request and call `handle`, and the
//! compiler picks the single matching implementation.
//!
//! ```
//! use async_trait::async_trait;
//! use contracts::{Handler, Request};
//!
//! struct Ping;
//! impl Request for Ping {
//!     type Response = &'static str;
//! }
//!
//! struct PingService;
//!
//! #[async_trait]
//! impl Handler<Ping> for PingService {
//!     type Error = std::convert::Infallible;
//!
//!     async fn handle(&self, _request: Ping) -> Result<&'static str, Self::Error> {
//!         Ok("pong")
//!     }
//! }
//! ```

use async_trait::async_trait;

pub trait Request: Send {
    type Response: Send;
}

#[async_trait]
pub trait Handler<Q: Request + 'static>: Send + Sync {
    type Error: Send;

    async fn handle(&self, request: Q) -> Result<Q::Response, Self::Error>;
}
