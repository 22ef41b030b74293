mod host;

pub use host::{BundleHost, BundleStatus, StartReport};
