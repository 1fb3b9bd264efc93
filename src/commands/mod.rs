//! CLI command implementations for fsort.
//!
//! - [`sort`] - Merge, sort and deduplicate line files, or verify already sorted ones

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod sort;
