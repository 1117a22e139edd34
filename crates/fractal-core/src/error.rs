use thiserror::Error;

/// Failures reported by field generation.
///
/// None of these can occur once recursion has started; every variant is
/// detected while validating parameters, before the existing field is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// A size of zero was requested. The generator keeps its previous field.
    #[error("requested field size is zero")]
    ZeroSize,

    /// The working grid for this size cannot be addressed with `usize`.
    #[error("requested field size {size} is too large")]
    TooLarge { size: usize },

    #[error("{name} must be finite, got {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}
