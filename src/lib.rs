//! Phase averaging and turbulence statistics of rotor simulation signals.
//!
//! The engines in [`phase`], [`turbulence`], [`crop`] and [`spectral`] are pure
//! functions over borrowed slices. [`manager`] drives them over the signal
//! files of a case directory.

pub mod analysis;
pub mod config;
pub mod crop;
pub mod error;
pub mod manager;
pub mod model;
pub mod phase;
pub mod spectral;
pub mod stats;
pub mod turbulence;

pub use crop::{CroppedArrays, TimeLimits, crop_arrays};
pub use error::{AnalysisError, ErrorKind};
pub use phase::{PhaseAverageOptions, PhaseAverageResult, phase_average};
pub use turbulence::{TurbulenceResult, calculate_turbulence_properties};
