#![allow(dead_code)]

use std::collections::BTreeMap;

use pipedag::config::{ConfigFile, PipelineSection, TaskConfig};
use pipedag::exec::BuiltinOperation;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: ConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile {
                pipeline: PipelineSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.config.pipeline.name = name.to_string();
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(op: BuiltinOperation) -> Self {
        Self {
            task: TaskConfig { op, after: vec![] },
        }
    }

    pub fn range(start: i64, count: u64) -> Self {
        Self::new(BuiltinOperation::Range { start, count })
    }

    pub fn just(values: &[i64]) -> Self {
        Self::new(BuiltinOperation::Just {
            values: values.to_vec(),
        })
    }

    pub fn sum() -> Self {
        Self::new(BuiltinOperation::Sum)
    }

    pub fn fail(message: &str) -> Self {
        Self::new(BuiltinOperation::Fail {
            message: message.to_string(),
        })
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
