//! Click's two-step signed webhook protocol (§4.6). Each request's
//! signature is verified with `md5`/`hex`, grounded on the MD5
//! hex-digest-signature idiom used by webhook verifiers across the
//! retrieval pack's payment-adjacent examples.

mod gateway;
mod signature;

pub use gateway::{ClickCompleteRequest, ClickGateway, ClickPrepareRequest, ClickResponse};
