//! TOML configuration for building queues and driving the producer/consumer
//! demo.
//!
//! ```toml
//! [queue]
//! capacity = 4          # omit for an unbounded queue
//!
//! [workload]
//! producers = 3
//! consumers = 2
//! items_per_producer = 100
//! max_work_jitter_ms = 2
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::bounded::BoundedQueue;
use crate::error::QueueError;
use crate::message_queue::MessageQueue;
use crate::queue::Queue;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid queue settings: {0}")]
    Queue(#[from] QueueError),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSettings {
    /// Admission limit; `None` builds an unbounded queue.
    pub capacity: Option<i64>,
}

impl QueueSettings {
    /// Builds the configured queue flavour.
    pub fn build<T: Send + 'static>(&self) -> Result<Arc<dyn MessageQueue<T>>, ConfigError> {
        let queue: Arc<dyn MessageQueue<T>> = match self.capacity {
            Some(capacity) => Arc::new(BoundedQueue::new(capacity)?),
            None => Arc::new(Queue::new()),
        };
        Ok(queue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadSettings {
    pub producers: usize,
    pub consumers: usize,
    pub items_per_producer: usize,
    /// Upper bound of the random pause between items, in milliseconds.
    pub max_work_jitter_ms: u64,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            producers: 2,
            consumers: 2,
            items_per_producer: 50,
            max_work_jitter_ms: 1,
        }
    }
}

impl WorkloadSettings {
    /// Items produced over the whole run.
    pub fn total_items(&self) -> Result<usize, ConfigError> {
        self.producers
            .checked_mul(self.items_per_producer)
            .ok_or_else(|| {
                invalid(
                    "workload.items_per_producer",
                    format!(
                        "{} producers x {} items overflows the item count",
                        self.producers, self.items_per_producer
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    pub queue: QueueSettings,
    pub workload: WorkloadSettings,
}

impl DemoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(capacity) = self.queue.capacity {
            crate::bounded::validate_capacity(capacity)?;
        }

        let workload = &self.workload;
        if workload.producers == 0 {
            return Err(invalid("workload.producers", "at least one producer is required"));
        }
        if workload.consumers == 0 {
            return Err(invalid("workload.consumers", "at least one consumer is required"));
        }
        let total = workload.total_items()?;
        if total % workload.consumers != 0 {
            return Err(invalid(
                "workload.consumers",
                format!(
                    "{total} items cannot be split evenly across {} consumers",
                    workload.consumers
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}
