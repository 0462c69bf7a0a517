//! # pixshelf
//!
//! Upload-time image transforms for a file shelf. Images coming in are
//! resized to a target box and, optionally, cut out from their background
//! with a classical mask chain. The result is always a PNG. Stored images
//! can be previewed as 200×200 progressive JPEG cover thumbnails.
//!
//! # Architecture
//!
//! ```text
//! bytes ─▶ decode ─▶ resize ─┬─▶ PNG                          (keep background)
//!                            └─▶ enhance ─▶ masks ─▶ combine ─▶ composite ─▶ PNG
//!
//! bytes ─▶ decode ─▶ center crop ─▶ resize ─▶ progressive JPEG  (thumbnail)
//! ```
//!
//! Every stage is a pure function from pixels to pixels. The [`imaging::Pipeline`]
//! strings them together behind a [`imaging::TransformGate`] so that only a
//! bounded number of full-resolution buffers are alive at once. Nothing is
//! cached between calls.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode, resize, enhance, masks, composite, thumbnail, and the pipeline that runs them |
//! | [`service`] | Upload/preview glue between callers, the pipeline and an object store |
//! | [`store`] | [`store::ObjectStore`] contract and the in-memory implementation |
//! | [`media`] | Media-type lookups and object-key naming |
//! | [`config`] | `pixshelf.toml` loading, merging, and validation |
//! | [`logging`] | Tracing subscriber setup for the CLI |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and PNG output use the `image` crate; the thumbnail's progressive
//! JPEG comes from `jpeg-encoder`. The background cutout is threshold, median,
//! Laplacian and blur arithmetic on 8-bit buffers, with no model files and
//! no native libraries.
//!
//! ## Validate Before Decode
//!
//! [`imaging::ProcessingOptions`] can only be built through validating
//! constructors, so a bad width is rejected before a single byte of the image
//! is read.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod media;
pub mod output;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
