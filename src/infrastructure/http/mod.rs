//! HTTP transport adapters

mod reqwest;

pub use self::reqwest::ReqwestTransport;
