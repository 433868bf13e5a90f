//! flownext デモ
//!
//! 4 つのユーザータスクが直列に並んだプロセスを in-memory エンジンで開始し、
//! 「完了 → Flow-To-Next で次を解決」を終了まで繰り返して、
//! 各ステップのレスポンス（JSON）を標準出力に出します。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flownext_core::domain::{AuthSnapshot, FlowToNextView, TaskId, UserId};
use flownext_core::impls::{InMemoryProcessEngine, ProcessDefinition, TaskLocalAuthContext, UserTaskDef};
use flownext_core::{FlowToNextRequest, FlowToNextResolver, ResolverConfig};

/// Walks a four-step process, resolving the next task after each completion.
#[derive(Debug, Parser)]
#[command(name = "flownext", version, about)]
struct Cli {
    /// Wait budget per resolution, in seconds (negative means a single query).
    #[arg(long, allow_negative_numbers = true)]
    timeout_secs: Option<i64>,

    /// Pause between poll iterations, in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Delay before the engine materializes the next step after a completion.
    #[arg(long, default_value_t = 0)]
    continuation_delay_ms: u64,

    /// Path to a TOML config file (defaults to ./flownext.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Match any actionable task instead of the user's own.
    #[arg(long, default_value_t = false)]
    ignore_assignee: bool,

    /// User the demo session logs in as.
    #[arg(long, default_value = "alice")]
    user: String,
}

impl Cli {
    fn resolver_config(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => ResolverConfig::load_from(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ResolverConfig::load()?,
        };
        if let Some(ms) = self.interval_ms {
            if ms == 0 {
                bail!("--interval-ms must be greater than zero");
            }
            config.poll_interval_ms = ms;
        }
        Ok(config)
    }

    fn request(&self) -> FlowToNextRequest {
        let mut request = FlowToNextRequest::default();
        if let Some(secs) = self.timeout_secs {
            request = request.with_timeout_secs(secs);
        }
        if self.ignore_assignee {
            request = request.ignoring_assignee(true);
        }
        request
    }
}

fn four_step_process(user: &UserId) -> ProcessDefinition {
    (1..=4).fold(ProcessDefinition::new("four-step"), |def, i| {
        def.user_task(UserTaskDef::new(format!("T{i}")).candidate_user(user.clone()))
    })
}

fn print_view(step: &str, view: &FlowToNextView) -> anyhow::Result<()> {
    println!("{step}: {}", serde_json::to_string(view)?);
    Ok(())
}

async fn run(
    engine: InMemoryProcessEngine,
    resolver: FlowToNextResolver,
    request: FlowToNextRequest,
    user: UserId,
) -> anyhow::Result<()> {
    let pi = engine.start_process(four_step_process(&user))?;
    info!(process_instance_id = %pi, "process started");

    let mut view = resolver.flow_to_next_for_instance(pi, &request).await?;
    print_view("start", &view)?;

    while !view.flow_to_end {
        let Some(next) = view.flow_to_next.first() else {
            bail!("no next task before the wait budget ran out");
        };
        let task_id: TaskId = next.parse()?;
        let name = engine.task(task_id)?.name;

        // 担当者として claim してから完了する
        engine.claim(task_id, user.clone())?;
        let completed = engine.complete_task(task_id)?;

        view = resolver.flow_to_next_after_task(&completed, &request).await?;
        print_view(&format!("completed {name}"), &view)?;
    }

    info!(process_instance_id = %pi, "process ended");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolver_config()?;
    let request = cli.request();
    let user = UserId::new(cli.user.clone());

    // (A) エンジンとリゾルバを用意
    let engine = InMemoryProcessEngine::builder()
        .continuation_delay(Duration::from_millis(cli.continuation_delay_ms))
        .build();
    let resolver = FlowToNextResolver::new(Arc::new(engine.clone()), Arc::new(TaskLocalAuthContext))
        .with_config(config);

    // (B) ログイン中のセッションを載せて実行
    let session = Some(AuthSnapshot::user(user.clone()));
    TaskLocalAuthContext::scope(session, run(engine, resolver, request, user)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::parse_from(["flownext"]);
        assert!(cli.timeout_secs.is_none());
        assert!(cli.interval_ms.is_none());
        assert_eq!(cli.continuation_delay_ms, 0);
        assert!(!cli.ignore_assignee);
        assert_eq!(cli.user, "alice");
        assert_eq!(cli.request(), FlowToNextRequest::default());
    }

    #[test]
    fn cli_builds_request_from_flags() {
        let cli = Cli::parse_from(["flownext", "--timeout-secs", "-1", "--ignore-assignee"]);
        let request = cli.request();
        assert_eq!(request.timeout_secs, Some(-1));
        assert_eq!(request.ignore_assignee, Some(true));
    }

    #[test]
    fn zero_interval_flag_is_rejected() {
        let cli = Cli::parse_from([
            "flownext",
            "--interval-ms",
            "0",
            "--config",
            "does-not-exist.toml",
        ]);
        assert!(cli.resolver_config().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn demo_walks_to_the_end() {
        let user = UserId::new("alice");
        let engine = InMemoryProcessEngine::builder()
            .continuation_delay(Duration::from_millis(300))
            .build();
        let resolver =
            FlowToNextResolver::new(Arc::new(engine.clone()), Arc::new(TaskLocalAuthContext));
        let request = FlowToNextRequest::default().with_timeout_secs(5);

        let session = Some(AuthSnapshot::user(user.clone()));
        TaskLocalAuthContext::scope(session, run(engine, resolver, request, user))
            .await
            .unwrap();
    }
}
