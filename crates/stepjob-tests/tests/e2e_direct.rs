//! End-to-end runs through the direct engine.

#![cfg(unix)]

use pretty_assertions::assert_eq;
use stepjob_exec::{build_engine, make_step, EngineKind, StepOptions};
use stepjob_spec::{StepArg, StepError};
use stepjob_tests::harness::StepHarness;

#[test]
fn direct_step_passes_extras_and_skips_scheduler() {
    let harness = StepHarness::new();
    let script = harness.job_script("plot.sh", 0);
    let engine = build_engine(EngineKind::Direct, harness.engine_config());

    let step = make_step("transform", true, StepOptions::new(&script, "plot"), engine).unwrap();
    step.call(vec![
        StepArg::files(vec!["calls.vcf"]),
        StepArg::files(vec!["report.pdf", "report.html"]),
        StepArg::tokens(["--dpi", "300"]),
    ])
    .unwrap();

    // The fake scheduler is configured but never invoked.
    assert!(harness.scheduler_args().is_empty());

    let calls = harness.mail_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].subject(), Some("[test] Pipeline step plot finished"));
    assert!(harness
        .mailed_attachments()
        .contains("args: -v calls.vcf -r report.pdf -z report.html --dpi 300"));
    assert_eq!(harness.artifact_count(), 0);
}

#[test]
fn direct_failure_propagates_after_notification() {
    let harness = StepHarness::new();
    let script = harness.job_script("qc.sh", 1);
    let engine = build_engine(EngineKind::Direct, harness.engine_config());

    let step = make_step("originate", false, StepOptions::new(&script, "qc"), engine).unwrap();
    let err = step.call(vec![StepArg::files("qc.html")]).unwrap_err();

    assert!(matches!(
        err.as_step(),
        Some(StepError::NonZeroExit { exit_code: 1, .. })
    ));
    let calls = harness.mail_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].subject(), Some("[test] Pipeline step qc FAILED"));
    assert_eq!(harness.artifact_count(), 0);
}

#[test]
fn unrecognized_file_fails_before_anything_runs() {
    let harness = StepHarness::new();
    let script = harness.job_script("merge.sh", 0);
    let engine = build_engine(EngineKind::Direct, harness.engine_config());

    let step = make_step("transform", false, StepOptions::new(&script, "merge"), engine).unwrap();
    let err = step
        .call_transform(vec!["a.bam"], vec!["merged.cram"], None)
        .unwrap_err();

    assert!(matches!(
        err.as_step(),
        Some(StepError::UnrecognizedExtension { extension, .. }) if extension == ".cram"
    ));
    assert!(harness.mail_calls().is_empty());
    assert_eq!(harness.artifact_count(), 0);
}
