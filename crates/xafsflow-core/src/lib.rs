//! Spectral data wrangling for X-ray absorption spectroscopy workflows:
//! reading normalised spectra, aligning them on a shared energy grid and
//! decomposing unknown spectra into non-negative combinations of references.

pub mod domain;
pub mod modules;
pub mod numerics;
pub mod table;
pub mod workflow;
