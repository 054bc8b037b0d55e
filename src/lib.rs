//! Face preprocessing and Eigenfaces/Fisherfaces face recognition.
//!
//! The library is split into two halves:
//!
//! * [`pipeline`] turns camera frames into *canonical faces*: small, square, grayscale images in
//!   which both eyes are at fixed positions, brightness and contrast are standardized and
//!   everything but the face itself is masked out. Faces and eyes are found by external
//!   [`Classifier`]s (for example Haar cascades); this library only prepares their input and
//!   interprets their output.
//! * [`recognition`] trains linear appearance models on canonical faces and uses them to identify
//!   people (or to reject faces it does not know).
//!
//! # Coordinates
//!
//! All coordinates are in pixels, with X pointing right and Y pointing *down*. "Left" and "right"
//! eye refer to the image, not to the depicted person.
//!
//! # Environment Variables
//!
//! * `RUST_LOG`: overrides the log levels set by [`init_logger!`], see [`env_logger`].
//!
//! [`Classifier`]: detector::Classifier

use log::LevelFilter;

pub mod align;
pub mod collect;
pub mod detector;
mod error;
pub mod eye;
pub mod illumination;
pub mod image;
pub mod mask;
pub mod pipeline;
pub mod recognition;
pub mod timer;

pub use error::{Error, Result};

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and this library will log at *debug* level, unless overridden with
/// `RUST_LOG`.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
