mod common;

use common::ScriptedRunner;
use lustre_bench::bench::{BenchmarkBatch, CacheControl, ThroughputBenchmark};
use lustre_bench::config::persistence::ResultsStorage;
use lustre_bench::models::Operation;
use lustre_bench::util::BlockSize;
use lustre_bench::LustreBenchError;
use tempfile::TempDir;
use tracing::Span;

fn one_meg() -> BlockSize {
    BlockSize::parse("1M").unwrap()
}

#[tokio::test]
async fn test_batch_runs_sizes_in_order() {
    let mount = TempDir::new().unwrap();
    let bench = ThroughputBenchmark::new(ScriptedRunner::new(), mount.path(), Span::none());

    let run = BenchmarkBatch::new(&bench, one_meg())
        .run_batch(&[1024, 2048])
        .await
        .unwrap();

    assert_eq!(run.mount_path, mount.path());
    let sizes: Vec<u64> = run.entries.iter().map(|e| e.size_mb).collect();
    assert_eq!(sizes, vec![1024, 2048]);
    for entry in &run.entries {
        assert_eq!(entry.write.operation(), Operation::Write);
        assert_eq!(entry.read.operation(), Operation::Read);
        assert!(entry.write.duration_secs() > 0.0);
        assert!(entry.read.duration_secs() > 0.0);
        assert!(entry.write.throughput_mbps().is_finite());
    }

    // Per size: sync, tee, dd write, sync, tee, dd read
    let argvs = bench.runner().argvs();
    assert_eq!(argvs.len(), 12);
    let dd: Vec<&Vec<String>> = argvs.iter().filter(|a| a[0] == "dd").collect();
    assert!(dd[0][2].ends_with("write_test_1024mb.dat"));
    assert_eq!(dd[1][1], format!("if={}", bench.test_file_path(1024).display()));
    assert!(dd[2][2].ends_with("write_test_2048mb.dat"));
    assert!(dd[3].contains(&"count=2048".to_string()));
}

#[tokio::test]
async fn test_batch_failure_surfaces_stderr_and_stops() {
    let mount = TempDir::new().unwrap();
    // Command 2 is the first dd write
    let runner = ScriptedRunner::failing_at(2, "dd: failed to open: No space left on device");
    let bench = ThroughputBenchmark::new(runner, mount.path(), Span::none());

    let err = BenchmarkBatch::new(&bench, one_meg())
        .run_batch(&[1024, 2048])
        .await
        .unwrap_err();

    match err {
        LustreBenchError::CommandExecution {
            command,
            exit_code,
            stderr,
        } => {
            assert!(command.starts_with("dd if=/dev/zero"));
            assert_eq!(exit_code, Some(1));
            assert!(stderr.contains("No space left on device"));
        }
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(bench.runner().commands().len(), 3);
    assert!(!bench.test_file_path(2048).exists());
}

#[tokio::test]
async fn test_batch_results_persist_as_record() {
    let mount = TempDir::new().unwrap();
    let bench = ThroughputBenchmark::new(ScriptedRunner::new(), mount.path(), Span::none())
        .with_cache_control(CacheControl::disabled());

    let run = BenchmarkBatch::new(&bench, one_meg())
        .run_batch(&[1024])
        .await
        .unwrap();
    assert_eq!(bench.runner().count_program("sync"), 0);

    let storage = ResultsStorage::new(mount.path().join("performance_results"));
    let path = storage.persist(&run).unwrap();
    let record = storage.load(&path).unwrap();

    assert_eq!(record.version, 1);
    assert_eq!(record.mount_point, mount.path());
    assert_eq!(record.tests.len(), 1);
    assert_eq!(record.tests[0].size_mb, 1024);
    assert_eq!(record.tests[0].write.duration, run.entries[0].write.duration_secs());
    assert_eq!(
        record.tests[0].read.throughput,
        run.entries[0].read.throughput_mbps()
    );
    assert_eq!(storage.list().unwrap(), vec![path]);
}
