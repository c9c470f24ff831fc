//! Payme's JSON-RPC protocol (§4.6). Basic-auth verification happens in the
//! `api` crate's middleware, sitting in front of route handlers rather than
//! inside this module.

mod errors;
mod rpc;

pub use errors::PaymeError;
pub use rpc::{PaymeGateway, RpcRequest, RpcResponse};
