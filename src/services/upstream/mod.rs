//! Upstream Media API Integration
//!
//! The media catalog and its stream resolver live behind an h5 API that only
//! answers requests that look like they come from its own web player. This
//! module provides:
//!
//! - **Client**: identity headers, fixed timeout, one retry on transport failure
//! - **Headers**: identity, browser-session and CDN header sets
//! - **Types**: payloads and the envelope parse for the API's response shapes
//! - **Endpoints**: typed calls for play, caption, detail and home
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::services::upstream::{PlayParams, UpstreamClient};
//!
//! let client = UpstreamClient::new(settings)?;
//! match client.play(&params).await?.into_parts() {
//!     Ok((data, _raw)) => data.variants(),
//!     Err(rejected) => /* answer 400 with the diagnostic */,
//! }
//! ```

pub mod client;
pub mod endpoints;
pub mod headers;
pub mod types;

pub use client::{UpstreamClient, UpstreamError, UpstreamRequest, UpstreamSettings};
pub use endpoints::{CaptionParams, PlayParams};
pub use types::{CaptionData, DetailData, Envelope, HomeData, PlayData};
