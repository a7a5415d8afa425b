//! # gifpress
//!
//! A batch GIF re-encoder. Point it at a folder of GIF files and a target
//! size; every file is decoded, scaled toward the target, re-encoded, and
//! written to an `optimized/` subfolder while aggregate statistics accumulate.
//!
//! # Architecture: One Pipeline, Four Layers
//!
//! ```text
//! Batch Processor      batch::process_folder     folder → per-file loop → BatchStats
//!   └─ File Optimizer  optimizer::optimize_file  stat → decode → scale → encode → stat
//!        ├─ Estimator  scale::estimate_scale     size ratio → linear scale factor
//!        └─ Codec      codec::{decode, encode}   GIF ↔ RGBA frames + loop metadata
//! ```
//!
//! Data flows one direction: the batch layer hands paths down, statistics and
//! progress flow back up as plain values. No two layers share mutable state;
//! the only per-run accumulator is the [`stats::BatchStats`] owned by the
//! batch loop.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`batch`] | Folder enumeration, sequential per-file loop, progress + stats |
//! | [`optimizer`] | Single-file pipeline; converts every per-file error into data |
//! | [`codec`] | GIF decode to RGBA frames and palette-quantized re-encode |
//! | [`scale`] | Pure size-to-scale and dimension math |
//! | [`config`] | Immutable per-run [`config::OptimizationConfig`] + validation |
//! | [`stats`] | Per-file and aggregate outcome records |
//! | [`report`] | Pure formatting of per-file lines and the final summary |
//!
//! # Design Decisions
//!
//! ## Single-Pass Size Heuristic
//!
//! The engine does not iterate toward the target size. Encoded GIF size is
//! roughly proportional to pixel count, and pixel count scales quadratically
//! with linear dimension, so the square root of `target / original` is used
//! as the linear scale factor, clamped to `[0.1, 1.0]`. One decode, one
//! resize, one encode per file — predictable cost, approximate result.
//!
//! ## Failure Is Data, Not Control Flow
//!
//! A corrupt file must never abort a batch. Every error past the initial
//! stat — decode, resize, encode, output stat — is caught inside
//! [`optimizer::optimize_file`] and returned as a failed
//! [`stats::FileStats`]. Only configuration and folder errors, detected
//! before any file is touched, abort the run.
//!
//! ## Sequential By Contract
//!
//! Files are processed strictly one at a time in sorted filename order.
//! Progress callbacks and log lines therefore arrive in a deterministic
//! order, and the stats accumulator needs no synchronization. Callers who
//! want a responsive UI run the whole batch on a worker thread; the engine
//! itself spawns nothing.
//!
//! ## Pure-Rust Codec Stack
//!
//! Decoding uses the `image` crate's GIF support (frames arrive already
//! composited to the full canvas, so disposal methods are handled once,
//! upstream). Encoding drives the `gif` crate directly with `color_quant`
//! palettes, because the configured color count must reach the quantizer —
//! the higher-level encoder hard-codes 256 colors. No external binaries, no
//! system libraries.

pub mod batch;
pub mod codec;
pub mod config;
pub mod optimizer;
pub mod report;
pub mod scale;
pub mod stats;
