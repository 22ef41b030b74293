use serde::Deserialize;

/// Operands read from `bundles.consumer.config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumerConfig {
    pub a: i64,
    pub b: i64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self { a: 3, b: 4 }
    }
}
