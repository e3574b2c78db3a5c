//! Remote-command fan-out.
//!
//! One concurrent worker per target, joined before returning, so the
//! call's latency is the slowest single target rather than the sum.
//! Execution order is nondeterministic; the aggregate is sorted by target
//! tag to give callers a stable order.

use std::sync::Arc;
use std::time::Duration;

use flotilla_api::ErrorCode;
use flotilla_api::ErrorInfo;
use flotilla_api::ExecResult;
use flotilla_api::ExecResults;
use flotilla_core::CommandRunner;
use flotilla_core::Tag;
use tracing::debug;

/// Run `commands` on every target concurrently and aggregate the
/// per-target outcomes, sorted by target tag.
pub async fn run_on_targets(
    runner: Arc<dyn CommandRunner>,
    targets: Vec<Tag>,
    commands: String,
    timeout: Duration,
) -> ExecResults {
    debug!(target_count = targets.len(), "fanning out remote command");
    let mut workers = Vec::with_capacity(targets.len());
    for tag in targets {
        let runner = Arc::clone(&runner);
        let commands = commands.clone();
        let worker_tag = tag.clone();
        let handle = tokio::spawn(async move { runner.run(&worker_tag, &commands, timeout).await });
        workers.push((tag, handle));
    }

    let mut results = Vec::with_capacity(workers.len());
    for (tag, handle) in workers {
        let result = match handle.await {
            Ok(Ok(output)) => ExecResult {
                tag: tag.to_string(),
                stdout: output.stdout,
                stderr: output.stderr,
                code: output.code,
                error: None,
            },
            Ok(Err(err)) => failed_result(&tag, ErrorInfo::from(err)),
            Err(join_err) => failed_result(&tag, ErrorInfo::new(ErrorCode::Backend, format!("execution worker failed: {join_err}"))),
        };
        results.push(result);
    }
    results.sort_by(|a, b| a.tag.cmp(&b.tag));
    ExecResults { results }
}

fn failed_result(tag: &Tag, error: ErrorInfo) -> ExecResult {
    ExecResult {
        tag: tag.to_string(),
        stdout: String::new(),
        stderr: String::new(),
        code: -1,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use flotilla_core::test_support::EchoRunner;

    use super::*;

    #[tokio::test]
    async fn results_are_sorted_by_target_tag() {
        let runner = Arc::new(EchoRunner::new());
        let targets = vec![Tag::machine("2"), Tag::machine("0"), Tag::machine("1")];
        let results = run_on_targets(runner, targets, "uptime".to_string(), Duration::from_secs(5)).await;

        let tags: Vec<&str> = results.results.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["machine-0", "machine-1", "machine-2"]);
        assert_eq!(results.results[0].stdout, "machine-0: uptime");
    }

    #[tokio::test]
    async fn per_target_failures_do_not_abort_siblings() {
        let runner = Arc::new(EchoRunner::new());
        runner.fail_target("machine-1");
        let targets = vec![Tag::machine("0"), Tag::machine("1")];
        let results = run_on_targets(runner, targets, "uptime".to_string(), Duration::from_secs(5)).await;

        assert!(results.results[0].error.is_none());
        let failure = results.results[1].error.as_ref().unwrap();
        assert_eq!(failure.message, "cannot reach machine-1");
        assert_eq!(results.results[1].code, -1);
    }
}
