//! Configuration for the lazy transform pass.

/// Name suffix that marks parameter-transform functions.
pub const DEFAULT_SUFFIX: &str = "transform_params";

/// Options for [`LazyTransformParams`](crate::LazyTransformParams).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LazyTransformOptions {
    /// Functions whose name ends with this suffix are rewritten.
    pub suffix: String,
    /// Also release computed intermediates (not only fetched inputs) after
    /// their last use. Computed outputs are then released after their commit.
    pub release_intermediates: bool,
    /// Rewrite selected functions on the rayon thread pool.
    pub parallel: bool,
}

impl Default for LazyTransformOptions {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_SUFFIX.to_owned(),
            release_intermediates: false,
            parallel: false,
        }
    }
}

impl LazyTransformOptions {
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn with_release_intermediates(mut self, enabled: bool) -> Self {
        self.release_intermediates = enabled;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Whether a function named `name` is selected by these options.
    pub fn selects(&self, name: &str) -> bool {
        name.ends_with(self.suffix.as_str())
    }
}
