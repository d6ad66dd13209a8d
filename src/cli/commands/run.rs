//! Run command - invoke targets against a project

use crate::cli::args::RunArgs;
use crate::config::Config;
use crate::error::{HoistError, HoistResult};
use crate::event::{
    BuildEvent, BuildId, ChannelTransport, EventKind, EventSink, JsonLinesTransport, Transport,
};
use crate::executor::CommandExecutor;
use crate::invoke::{
    ExecutionMode, InvocationRequest, Orchestrator, ProjectId, PropertySet, TargetExecutor,
    TargetName,
};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> HoistResult<()> {
    let request = build_request(&args, config)?;
    let build_id = BuildId::new();
    debug!("Logical build {}", build_id);

    // A JSON-lines event log when requested (--events, falling back to
    // [general].event_log), otherwise an in-process drain that prints
    // forwarded events to the console.
    let event_log = args.events.clone().or_else(|| config.general.event_log.clone());
    let (transport, drain): (Arc<dyn Transport>, Option<tokio::task::JoinHandle<()>>) =
        match &event_log {
            Some(path) => {
                let file = std::fs::File::create(path)
                    .map_err(|e| HoistError::io(format!("creating {}", path.display()), e))?;
                (Arc::new(JsonLinesTransport::new(Box::new(file))), None)
            }
            None => {
                let (transport, mut rx) = ChannelTransport::new();
                let drain = tokio::spawn(async move {
                    while let Some(envelope) = rx.recv().await {
                        let text = envelope.event.payload["text"]
                            .as_str()
                            .unwrap_or_default()
                            .to_string();
                        match envelope.event.kind {
                            EventKind::Error => {
                                eprintln!("{} {}", style("error:").red().bold(), text)
                            }
                            EventKind::Warning => {
                                eprintln!("{} {}", style("warning:").yellow(), text)
                            }
                            _ => println!("{}", style(text).dim()),
                        }
                    }
                });
                (Arc::new(transport), Some(drain))
            }
        };

    let sink = Arc::new(EventSink::attach(transport));
    sink.consume(BuildEvent::started(), build_id)?;

    let orchestrator = Arc::new(Orchestrator::with_sink(build_id, sink.clone()));
    let executor: Arc<dyn TargetExecutor> = Arc::new(CommandExecutor::new(config.targets.clone()));

    // Invocation runs as its own task so this context stays free
    let result = orchestrator
        .spawn(request, executor)
        .await
        .map_err(|e| HoistError::Internal(format!("invocation task panicked: {e}")))??;

    sink.consume(BuildEvent::finished(), build_id)?;
    sink.shut_down();
    if let Some(drain) = drain {
        let _ = drain.await;
    }

    for item in &result.outputs {
        println!("{}", item.spec);
    }

    if result.success {
        println!("{} {} output item(s)", style("Succeeded:").green().bold(), result.outputs.len());
        Ok(())
    } else {
        Err(HoistError::User("One or more batches failed".to_string()))
    }
}

/// Build the invocation request from CLI args layered over config
/// defaults
fn build_request(args: &RunArgs, config: &Config) -> HoistResult<InvocationRequest> {
    let project_dir = match &args.project {
        Some(path) => path.clone(),
        None => std::env::current_dir().map_err(|e| HoistError::io("getting current directory", e))?,
    };

    let targets = args
        .targets
        .iter()
        .map(TargetName::new)
        .collect::<HoistResult<Vec<_>>>()?;

    let mode = match &args.mode {
        Some(mode) => mode.parse::<ExecutionMode>()?,
        None => config.invoke.mode,
    };

    Ok(InvocationRequest {
        project: ProjectId::new(canonicalize_lenient(project_dir)),
        properties: parse_properties(&args.properties)?,
        targets,
        mode,
        use_cache: config.invoke.use_cache && !args.no_cache,
        stop_on_first_failure: config.invoke.stop_on_first_failure && !args.keep_going,
    })
}

/// Canonicalize when possible; a nonexistent path is left as-is so the
/// executor can report it as a fault with the path the user typed.
fn canonicalize_lenient(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}

/// Parse repeated NAME=VALUE pairs into a property snapshot
fn parse_properties(pairs: &[String]) -> HoistResult<PropertySet> {
    let mut parsed = Vec::new();
    for pair in pairs {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            HoistError::User(format!("Invalid property {pair:?} (expected NAME=VALUE)"))
        })?;
        if name.is_empty() {
            return Err(HoistError::User(format!(
                "Invalid property {pair:?} (empty name)"
            )));
        }
        parsed.push((name.to_string(), value.to_string()));
    }
    Ok(PropertySet::from_pairs(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_properties_accepts_pairs() {
        let props =
            parse_properties(&["Configuration=Release".to_string(), "Platform=x64".to_string()])
                .unwrap();
        assert_eq!(props.get("Configuration"), Some("Release"));
        assert_eq!(props.get("Platform"), Some("x64"));
    }

    #[test]
    fn parse_properties_rejects_malformed() {
        assert!(parse_properties(&["NoEquals".to_string()]).is_err());
        assert!(parse_properties(&["=value".to_string()]).is_err());
    }

    #[test]
    fn build_request_layers_flags_over_config() {
        let mut config = Config::default();
        config.invoke.use_cache = true;

        let args = RunArgs {
            targets: vec!["Build".to_string()],
            project: Some(PathBuf::from("/tmp")),
            properties: vec![],
            mode: Some("separate".to_string()),
            no_cache: true,
            keep_going: true,
            events: None,
        };

        let request = build_request(&args, &config).unwrap();
        assert_eq!(request.mode, ExecutionMode::Separate);
        assert!(!request.use_cache);
        assert!(!request.stop_on_first_failure);
    }
}
