pub mod validation;

pub use validation::{
    format_duration, format_elapsed, format_file_size, generate_default_filename, validate_recording,
    ValidationError, ValidationReport,
};
