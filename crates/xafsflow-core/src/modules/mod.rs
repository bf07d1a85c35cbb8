pub mod aligned;
pub mod bound;
pub mod decompose;
pub mod interpolate;
pub mod reader;
pub mod sample_id;

mod traits;

pub use aligned::AlignedArray;
pub use bound::{BoundedDomain, GroupDomain, bound_x_values, bounded_domain, group_domains};
pub use decompose::{
    DecompositionOptions, DecompositionResult, default_model, fit_decomposition,
    fit_default_decomposition,
};
pub use interpolate::{InterpolationOptions, interpolate_table};
pub use reader::{Delimiter, ReaderOptions, read_spectra, read_spectrum, sample_label};
pub use sample_id::{SplitOptions, split_sample_identifier};
pub use traits::LinearModel;
