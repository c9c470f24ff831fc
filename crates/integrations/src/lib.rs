//! C6: payment-gateway protocol handlers. `payme` (JSON-RPC) and `click`
//! (signature-verified two-step webhook) are both inbound-only, so neither
//! needs an outbound HTTP client.

pub mod click;
pub mod payme;
pub mod refund;

pub use refund::refund;
