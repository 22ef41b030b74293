//! Addition SDK
//!
//! Everything a consumer needs to use the addition service:
//! - API trait (`AdditionService`)
//! - Error type (`AdditionError`)
//! - Registry name (`SERVICE_NAME`)
//!
//! ## Usage
//!
//! ```ignore
//! use addition_sdk::{AdditionService, SERVICE_NAME};
//!
//! if let Some(service) = ctx.registry().find_by_name(SERVICE_NAME) {
//!     let adder = service.casted_instance::<dyn AdditionService>()?;
//!     let sum = adder.add(3, 4)?;
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

mod api;

pub use api::{AdditionError, AdditionService, SERVICE_NAME};
