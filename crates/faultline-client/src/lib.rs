//! In-process error capture SDK for the faultline telemetry pipeline.
//!
//! The client intercepts runtime failures, normalises them into the
//! canonical report shape, enriches them with session identity, and delivers
//! them to the collection endpoint. Delivery is fire-and-forget: the calling
//! code is never blocked and never observes a telemetry failure. When the
//! channel itself fails, the report lands in a pluggable [`FallbackSink`]
//! instead of disappearing silently.
//!
//! Four failure shapes are understood: uncaught synchronous failures,
//! unhandled asynchronous rejections, failed outbound calls, and third-party
//! integration failures. [`hooks`] wires the first two to the process so
//! call sites need no explicit instrumentation.

#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod hooks;
pub mod normalise;
pub mod session;
pub mod sink;
pub mod transport;

pub use client::FaultlineClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use hooks::{install_panic_hook, watch};
pub use normalise::CapturedError;
pub use session::SessionContext;
pub use sink::{FallbackSink, TracingSink};
pub use transport::Transmitter;
