use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `@profile count=N warmup=W delay=D`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub count: u32,
    pub warmup: u32,
    pub delay: Duration,
}

impl Default for ProfileSpec {
    fn default() -> Self {
        Self {
            count: 1,
            warmup: 0,
            delay: Duration::ZERO,
        }
    }
}

/// `@compare env1, env2, ... baseline=env1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareSpec {
    pub environments: Vec<String>,
    pub baseline: String,
}
