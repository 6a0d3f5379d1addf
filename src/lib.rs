//! # Squish
//!
//! Single-image compression: re-encode at a fixed quality, shrink to fit a
//! bounding box, search for the quality that lands near a target file size,
//! or convert between formats.
//!
//! # Architecture
//!
//! A [`session::CompressionSession`] owns one decoded image and dispatches
//! each [`request::CompressionRequest`] through pure planning code into an
//! [`imaging::ImageBackend`]:
//!
//! ```text
//! bytes ──decode──▶ ImageAsset ──plan──▶ (dimensions, format, quality)
//!                                              │
//!                           fixed quality ─────┼───── target size
//!                                 │                        │
//!                              encode            binary search over encode
//!                                 └──────────┬─────────────┘
//!                                    CompressionResult
//! ```
//!
//! Planning (dimension math, quality bounds, format rules) has no I/O and is
//! unit tested directly. Everything that touches pixels sits behind the
//! backend trait, so the session and the search are tested against a mock
//! whose output size is an exact function of quality.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | State machine and mode dispatch; the public entry point |
//! | [`request`] | Requests, parameter validation, and compression results |
//! | [`imaging`] | Backend trait, `image`/`webp` backend, dimension planner, size search |
//! | [`config`] | Layered `squish.toml` loading and validation |
//! | [`naming`] | Output filename derivation |
//! | [`output`] | CLI text and JSON reporting |
//!
//! # Design Decisions
//!
//! ## Quality Only, Never Dimensions, For Size Targets
//!
//! Target-size mode searches quality at the source's own dimensions. A target
//! that the minimum quality cannot reach comes back as a best-effort result
//! rather than a silently downscaled image; the caller can follow up with a
//! resize.
//!
//! ## Closed Output Set
//!
//! Output is JPEG, PNG, WebP, GIF or BMP. Any format the `image` crate can
//! read is accepted as input, but names outside the output set are rejected
//! at parse time instead of falling back to a default.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod request;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
