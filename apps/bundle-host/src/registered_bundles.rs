// Links every bundle crate so its `bundle!` registration is collected by inventory.
// New bundles must be added here and to Cargo.toml.
#![allow(unused_imports)]

use addition_bundle as _;
use consumer_bundle as _;
use simple_bundle as _;
