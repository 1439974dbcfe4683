#[cfg(feature = "streamline-base")]
pub use streamline_base as base;

#[cfg(feature = "streamline-loader")]
pub use streamline_loader as loader;
