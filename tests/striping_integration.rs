mod common;

use common::ScriptedRunner;
use lustre_bench::bench::{StripingController, ThroughputBenchmark};
use lustre_bench::models::StripePolicy;
use lustre_bench::util::BlockSize;
use lustre_bench::LustreBenchError;
use tempfile::TempDir;
use tracing::Span;

fn controller(runner: ScriptedRunner, mount: &TempDir) -> StripingController<ScriptedRunner> {
    StripingController::new(ThroughputBenchmark::new(runner, mount.path(), Span::none()))
}

#[tokio::test]
async fn test_compare_writes_both_layouts() {
    let mount = TempDir::new().unwrap();
    let ctl = controller(ScriptedRunner::new(), &mount);

    let cmp = ctl
        .compare(mount.path(), 20, &BlockSize::parse("20M").unwrap())
        .await
        .unwrap();
    assert!(cmp.after_secs > 0.0);
    assert_eq!(cmp.speedup, cmp.before_secs / cmp.after_secs);

    assert!(mount.path().join("test_20gb_no_stripe").exists());
    assert!(mount.path().join("test_20gb_with_stripe").exists());

    let runner = ctl.benchmark().runner();
    assert_eq!(runner.count_program("dd"), 2);
    // Both timed writes run cold
    assert_eq!(runner.count_program("sync"), 2);
    assert!(runner
        .argvs()
        .iter()
        .any(|a| a.join(" ").starts_with("lfs setstripe -c -1 ")));
}

#[tokio::test]
async fn test_stripe_info_and_usage_are_verbatim() {
    let mount = TempDir::new().unwrap();
    let ctl = controller(ScriptedRunner::new(), &mount);

    let info = ctl.get_stripe_info(mount.path()).await.unwrap();
    assert!(info.starts_with(&mount.path().display().to_string()));
    let usage = ctl.get_ost_usage().await.unwrap();
    assert!(usage.contains("OST0000"));
}

#[tokio::test]
async fn test_apply_policy_with_explicit_count() {
    let mount = TempDir::new().unwrap();
    let ctl = controller(ScriptedRunner::new(), &mount);

    ctl.apply_policy(&StripePolicy::new(mount.path(), 4))
        .await
        .unwrap();
    assert_eq!(
        ctl.benchmark().runner().argvs()[0],
        vec![
            "lfs".to_string(),
            "setstripe".into(),
            "-c".into(),
            "4".into(),
            mount.path().display().to_string()
        ]
    );
}

#[tokio::test]
async fn test_lfs_failure_propagates() {
    let mount = TempDir::new().unwrap();
    let ctl = controller(
        ScriptedRunner::failing_at(0, "lfs: command not found"),
        &mount,
    );
    let err = ctl
        .compare(mount.path(), 1, &BlockSize::parse("1M").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, LustreBenchError::CommandExecution { .. }));
    assert_eq!(ctl.benchmark().runner().commands().len(), 1);
}
