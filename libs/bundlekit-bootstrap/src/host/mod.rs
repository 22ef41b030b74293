mod run;
mod signals;

pub use run::{build_host, run_once, run_until_cancelled};
pub use signals::{shutdown_token, wait_for_shutdown};
