//! Command dispatch and execution handlers.
//!
//! Every handler returns the process exit status. Results go to stdout,
//! errors to stderr, the prompt itself to the terminal on stderr.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;

use cortex_pick::{
    CandidateSource, ConfirmPrompt, Echo, KillAction, PickConfig, ProcessContext,
    PromptSignalChooser, Session, SessionOptions, SessionOutcome, SharedEvents, SharedSink,
    StaticSource, SystemShell, echo_channel, process_chooser,
};

use super::args::*;
use crate::files::list_files;
use crate::keys::KeyMode;
use crate::terminal::{SignalWatch, TerminalHandle, TerminalSink};

/// Dispatch a CLI command to its handler.
pub async fn dispatch_command(cli: Cli) -> Result<i32> {
    let config =
        PickConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Choose(args) => run_choose(args, config).await,
        Commands::Filter(args) => run_filter(args, config).await,
        Commands::Ps(args) => run_ps(args, config).await,
        Commands::Confirm(args) => run_confirm(args, config).await,
    }
}

/// Session options for `choose`: source order, arrow keys only.
pub fn choose_options(config: &PickConfig) -> SessionOptions {
    SessionOptions::new(config.selection_options().with_sort(false))
        .with_timeout(config.timeout_policy())
        .with_query_input(false)
}

/// Session options for `filter`.
pub fn filter_options(config: &PickConfig, args: &FilterArgs) -> SessionOptions {
    SessionOptions::new(
        config
            .selection_options()
            .with_sort(config.sort && !args.no_sort)
            .with_strict(config.strict && !args.no_strict),
    )
    .with_timeout(config.timeout_policy())
    .with_initial_query(args.value.clone())
}

/// Text to print on stdout for `outcome`, if any.
pub fn render_result(config: &PickConfig, outcome: &SessionOutcome) -> Option<String> {
    outcome
        .result()
        .filter(|result| !result.is_empty())
        .map(|result| config.format_result(result))
}

fn finish(config: &PickConfig, outcome: &SessionOutcome) -> i32 {
    tracing::debug!("Session {}", outcome.label());
    if let Some(text) = render_result(config, outcome) {
        println!("{}", text);
    }
    if let SessionOutcome::Error(e) = outcome {
        eprintln!("Error: {}", e);
    }
    config.exit_codes.code_for(outcome)
}

async fn read_stdin(header: Option<&String>) -> Result<StaticSource> {
    let source = StaticSource::read_from(tokio::io::stdin())
        .await
        .context("Failed to read options from stdin")?;
    Ok(match header {
        Some(header) => source.with_header(header.clone()),
        None => source,
    })
}

/// A fresh token that SIGINT and SIGTERM cancel while the watch lives.
fn signal_scope() -> Result<(CancellationToken, SignalWatch)> {
    let cancel = CancellationToken::new();
    let signals = SignalWatch::start(cancel.clone())?;
    Ok((cancel, signals))
}

async fn run_interactive(
    source: &dyn CandidateSource,
    options: SessionOptions,
    prompt: Option<String>,
) -> Result<SessionOutcome> {
    let (cancel, signals) = signal_scope()?;

    let mode = KeyMode::new(options.query_input, options.selection.limit != 1);
    let (terminal, mut events) = TerminalHandle::start(mode)?;
    let mut sink = TerminalSink::new(prompt);

    let outcome = Session::new(options, cancel)
        .run(source, &mut events, &mut sink)
        .await;

    drop(terminal);
    drop(signals);
    Ok(outcome)
}

async fn run_choose(args: ChooseArgs, config: PickConfig) -> Result<i32> {
    let config = args.select.apply(config);

    let source = if !args.options.is_empty() {
        let source = StaticSource::new(args.options);
        match &args.select.header {
            Some(header) => source.with_header(header.clone()),
            None => source,
        }
    } else if !std::io::stdin().is_terminal() {
        read_stdin(args.select.header.as_ref()).await?
    } else {
        bail!("No options given. Pass them as arguments or pipe them on stdin.");
    };

    let outcome = run_interactive(&source, choose_options(&config), None).await?;
    Ok(finish(&config, &outcome))
}

async fn run_filter(args: FilterArgs, config: PickConfig) -> Result<i32> {
    let config = args.select.apply(config);

    let source = if std::io::stdin().is_terminal() {
        let root = std::env::current_dir().context("Failed to read current directory")?;
        let files = list_files(&root)
            .with_context(|| format!("Failed to list files in {}", root.display()))?;
        let source = StaticSource::new(files);
        match &args.select.header {
            Some(header) => source.with_header(header.clone()),
            None => source,
        }
    } else {
        read_stdin(args.select.header.as_ref()).await?
    };

    let options = filter_options(&config, &args);
    let outcome = run_interactive(&source, options, Some(args.prompt)).await?;
    Ok(finish(&config, &outcome))
}

async fn run_confirm(args: ConfirmArgs, config: PickConfig) -> Result<i32> {
    let config = match args.timeout {
        Some(timeout) => config.with_timeout(timeout),
        None => config,
    };
    let prompt = ConfirmPrompt::new()
        .with_affirmative(args.affirmative)
        .with_negative(args.negative)
        .with_default(args.default)
        .with_prompt(args.prompt);

    let (cancel, signals) = signal_scope()?;

    let (terminal, mut events) = TerminalHandle::start(KeyMode::new(false, false))?;
    let mut sink = TerminalSink::new(None);
    let outcome = prompt
        .run(config.timeout_policy(), cancel, &mut events, &mut sink)
        .await;
    drop(terminal);
    drop(signals);

    tracing::debug!("Confirm {}", outcome.label());
    if let SessionOutcome::Error(e) = &outcome {
        eprintln!("Error: {}", e);
    }
    Ok(config
        .exit_codes
        .confirm_code_for(&outcome, prompt.is_affirmative(&outcome)))
}

async fn run_ps(args: PsArgs, config: PickConfig) -> Result<i32> {
    let max_iterations = args.max_iterations.or(config.max_iterations);
    let config = args
        .select
        .apply(config)
        .with_max_iterations(max_iterations);
    let options = config.session_options().with_initial_query(args.value);

    let (cancel, signals) = signal_scope()?;

    let mode = KeyMode::new(true, options.selection.limit != 1);
    let (terminal, channel) = TerminalHandle::start(mode)?;
    let mut events = SharedEvents::new(channel);
    let mut sink = SharedSink::new(TerminalSink::new(Some(args.prompt)));

    let shell = Arc::new(SystemShell::new(config.shell.clone()));
    let chooser = PromptSignalChooser::new(events.clone(), sink.clone(), cancel.clone());
    let (echo_tx, mut echo_rx) = echo_channel();
    let runner = process_chooser(
        &ProcessContext::current(),
        shell.clone(),
        KillAction::new(shell, Arc::new(chooser)).with_echo(echo_tx),
        cancel,
    )
    .with_options(options)
    .with_max_iterations(config.max_iterations);

    let report = runner.run(&mut events, &mut sink).await;
    drop(terminal);
    drop(signals);

    // Shown now that the alternate screen is gone.
    while let Ok(echo) = echo_rx.try_recv() {
        match echo {
            Echo::Stdout(text) => println!("{}", text.trim_end_matches('\n')),
            Echo::Stderr(text) => eprintln!("{}", text.trim_end_matches('\n')),
        }
    }

    tracing::info!(
        "Process chooser finished after {} rounds: {}",
        report.iterations,
        report.outcome.label()
    );
    if let SessionOutcome::Error(e) = &report.outcome {
        eprintln!("Error: {}", e);
    }
    Ok(config.exit_codes.code_for(&report.outcome))
}
