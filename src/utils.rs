//! # Utility Functions Module
//!
//! Small helpers for building external tool argument lists.

use crate::error::CompressError;
use std::path::Path;

/// Converts any iterable of string-like items to `Vec<String>`.
///
/// ```ignore
/// let args = to_string_vec(["--suffix", "-min", "--avif", "true"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Builds an argument vector from mixed expressions.
///
/// ```ignore
/// let args = args![input, "--multipass", "--output", output];
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item),*])
    };
}

/// A path as a tool argument; tools only ever see UTF-8
pub fn path_arg(path: &Path) -> Result<&str, CompressError> {
    path.to_str()
        .ok_or_else(|| CompressError::InvalidPath(format!("Non UTF-8 path: {}", path.display())))
}
