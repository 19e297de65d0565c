//! The fully assembled description of one job invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default number of scheduler tasks.
pub const DEFAULT_NTASKS: u32 = 1;
/// Default CPUs per task.
pub const DEFAULT_CPUS_PER_TASK: u32 = 1;
/// Default memory per CPU, in megabytes.
pub const DEFAULT_MEM_PER_CPU: u32 = 4000;
/// Default scheduling niceness.
pub const DEFAULT_NICE: i32 = 0;

/// Resource hints forwarded to the cluster scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceHints {
    /// Number of tasks.
    pub ntasks: u32,
    /// CPUs allocated to each task.
    pub cpus_per_task: u32,
    /// Memory per CPU in megabytes.
    pub mem_per_cpu: u32,
    /// Scheduling priority adjustment; higher is nicer.
    pub nice: i32,
}

impl Default for ResourceHints {
    fn default() -> Self {
        Self {
            ntasks: DEFAULT_NTASKS,
            cpus_per_task: DEFAULT_CPUS_PER_TASK,
            mem_per_cpu: DEFAULT_MEM_PER_CPU,
            nice: DEFAULT_NICE,
        }
    }
}

impl ResourceHints {
    /// Sets the task count.
    pub fn ntasks(mut self, ntasks: u32) -> Self {
        self.ntasks = ntasks;
        self
    }

    /// Sets the CPUs per task.
    pub fn cpus_per_task(mut self, cpus: u32) -> Self {
        self.cpus_per_task = cpus;
        self
    }

    /// Sets the memory per CPU in megabytes.
    pub fn mem_per_cpu(mut self, mem: u32) -> Self {
        self.mem_per_cpu = mem;
        self
    }

    /// Sets the niceness.
    pub fn nice(mut self, nice: i32) -> Self {
        self.nice = nice;
        self
    }
}

/// Everything needed to run one job: script, tokens, resources and name.
///
/// Built fresh for each step call and never modified afterwards, hence the
/// read-only accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRequest {
    script: PathBuf,
    args: Vec<String>,
    resources: ResourceHints,
    job_name: String,
}

impl SubmissionRequest {
    /// Creates a new submission request.
    pub fn new(
        script: impl Into<PathBuf>,
        args: Vec<String>,
        resources: ResourceHints,
        job_name: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            args,
            resources,
            job_name: job_name.into(),
        }
    }

    /// Path of the external job script.
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Flattened command-line tokens for the job script.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Scheduler resource hints.
    pub fn resources(&self) -> &ResourceHints {
        &self.resources
    }

    /// Human-readable job name.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Renders the direct invocation, `script arg arg ...`, for display.
    pub fn command_line(&self) -> String {
        std::iter::once(self.script.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_defaults() {
        let hints = ResourceHints::default();
        assert_eq!(hints.ntasks, 1);
        assert_eq!(hints.cpus_per_task, 1);
        assert_eq!(hints.mem_per_cpu, 4000);
        assert_eq!(hints.nice, 0);
    }

    #[test]
    fn test_resource_builder_and_partial_json() {
        let hints = ResourceHints::default().cpus_per_task(8).nice(100);
        assert_eq!(hints.cpus_per_task, 8);
        assert_eq!(hints.nice, 100);

        let parsed: ResourceHints = serde_json::from_str(r#"{"mem_per_cpu": 16000}"#).unwrap();
        assert_eq!(parsed.mem_per_cpu, 16000);
        assert_eq!(parsed.ntasks, 1);
    }

    #[test]
    fn test_command_line() {
        let request = SubmissionRequest::new(
            "src/sh/trim.sh",
            vec!["--fq".into(), "x.fq".into(), "-c".into(), "y.bam".into()],
            ResourceHints::default(),
            "trim",
        );
        assert_eq!(request.command_line(), "src/sh/trim.sh --fq x.fq -c y.bam");
        assert_eq!(request.job_name(), "trim");
    }
}
