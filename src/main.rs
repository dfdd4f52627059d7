use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

use clearprd_lib::config::loader::validate_config;
use clearprd_lib::config::{
    ClearPrdConfig, ConfigLoader, ConfigMerger, PartialConfig, PartialCopyConfig,
    PartialInterviewConfig,
};
use clearprd_lib::events::{
    EventBroadcaster, Notification, NotificationLevel, TipRotatedPayload, WorkflowEvent,
    EVENT_COUNTDOWN_EXPIRED, EVENT_NOTIFICATION, EVENT_PHASE_CHANGED, EVENT_TIP_ROTATED,
};
use clearprd_lib::parsers::to_plain_text;
use clearprd_lib::prd_workflow::{WorkflowHandle, WorkflowPhase, WorkflowRuntime, WorkflowSnapshot};
use clearprd_lib::FixtureService;

/// ClearPRD - Turn a product idea into a requirements document through a short interview
#[derive(Parser, Debug)]
#[command(name = "clearprd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Product idea (prompted for when omitted)
    idea: Option<String>,

    /// Config file to use instead of <config dir>/clearprd/config.toml
    #[arg(long, env = "CLEARPRD_CONFIG")]
    config: Option<PathBuf>,

    /// JSON fixture with questions and a document template (built-in fixture if omitted)
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Seconds on the question countdown
    #[arg(long)]
    budget: Option<u32>,

    /// Simulated collaborator latency in milliseconds
    #[arg(long, default_value = "800")]
    latency_ms: u64,

    /// Disable the OSC 52 terminal clipboard fallback
    #[arg(long)]
    no_osc52: bool,
}

type InputLines = Lines<BufReader<Stdin>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::init();

    let config = load_config(&cli)?;
    let service = match cli.fixture {
        Some(ref path) => FixtureService::from_path(path)?,
        None => FixtureService::builtin()?,
    }
    .with_latency(Duration::from_millis(cli.latency_ms));

    // Create the tokio runtime
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow!("Failed to create tokio runtime: {}", e))?;

    let result = rt.block_on(run_interview(config, service, cli.idea));

    // Stdin reads run on a blocking thread that would otherwise hold up shutdown
    rt.shutdown_background();
    result
}

/// Merge CLI flags over the config file over defaults
fn load_config(cli: &Cli) -> Result<ClearPrdConfig> {
    let loader = match cli.config {
        Some(ref path) => {
            if !path.exists() {
                return Err(anyhow!("Config file '{}' does not exist", path.display()));
            }
            ConfigLoader::with_path(path)
        }
        None => ConfigLoader::new(),
    };

    let overrides = PartialConfig {
        interview: Some(PartialInterviewConfig {
            question_budget_secs: cli.budget,
            tick_interval_ms: None,
        }),
        tips: None,
        copy: cli.no_osc52.then(|| PartialCopyConfig {
            osc52_fallback: Some(false),
        }),
    };

    let config = ConfigMerger::new()
        .with_file(loader.load()?)
        .with_cli(Some(overrides))
        .merge();
    validate_config(&config)?;
    Ok(config)
}

async fn run_interview(
    config: ClearPrdConfig,
    service: FixtureService,
    mut initial_idea: Option<String>,
) -> Result<()> {
    let events = Arc::new(EventBroadcaster::new());
    let (runtime, handle) = WorkflowRuntime::new(&config, service, events)?;
    let runtime_task = tokio::spawn(runtime.with_interrupt_handling().run());
    tokio::spawn(forward_events(handle.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Ok(snapshot) = handle.wait_idle().await else {
            break;
        };

        let keep_going = match snapshot.phase {
            WorkflowPhase::Idea => idea_step(&handle, &mut lines, initial_idea.take()).await?,
            WorkflowPhase::Questioning => question_step(&handle, &mut lines, &snapshot).await?,
            WorkflowPhase::Result => result_step(&handle, &mut lines, &snapshot).await?,
            // Only reachable if the runtime stopped mid-call
            WorkflowPhase::Generating => !handle.is_closed(),
        };

        if !keep_going {
            break;
        }
    }

    let _ = handle.shutdown().await;
    let _ = runtime_task.await;
    Ok(())
}

async fn idea_step(
    handle: &WorkflowHandle,
    lines: &mut InputLines,
    initial_idea: Option<String>,
) -> Result<bool> {
    let idea = match initial_idea {
        Some(idea) => idea,
        None => {
            println!("\n== {} ==", WorkflowPhase::Idea.display_name());
            match prompt(handle, lines, "Describe your product idea: ").await? {
                Some(idea) => idea,
                None => return Ok(false),
            }
        }
    };

    match handle.submit_idea(idea).await {
        Ok(()) => println!("Analyzing your idea..."),
        // Already reported as a notification
        Err(e) if e.is_validation() => {}
        Err(e) => return Err(e.into()),
    }
    Ok(true)
}

async fn question_step(
    handle: &WorkflowHandle,
    lines: &mut InputLines,
    snapshot: &WorkflowSnapshot,
) -> Result<bool> {
    println!(
        "\n== {} ({} questions, {}s on the clock) ==",
        WorkflowPhase::Questioning.display_name(),
        snapshot.questions.len(),
        snapshot.countdown_remaining
    );

    // Back here after a failed generation with every answer kept
    if snapshot.can_generate && !snapshot.answers.is_empty() {
        println!("{}", snapshot.answers.summary(&snapshot.questions));
        let Some(input) = prompt(handle, lines, "[g] generate again  [b] back: ").await? else {
            return Ok(false);
        };
        if input.eq_ignore_ascii_case("b") {
            handle.back().await?;
            return Ok(true);
        }
    }

    for question in snapshot.questions.iter() {
        if snapshot.answers.get(&question.id).is_some() {
            continue;
        }

        let category = question.category();
        println!("\n{} {} - {}", category.icon(), category.label(), question.prompt);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {}", i + 1, option.label);
        }

        loop {
            let remaining = handle.snapshot().countdown_remaining;
            let message = format!("Choice [1-{}, b = back] ({}s): ", question.options.len(), remaining);
            let Some(input) = prompt(handle, lines, &message).await? else {
                return Ok(false);
            };

            if input.eq_ignore_ascii_case("b") {
                handle.back().await?;
                return Ok(true);
            }

            let choice = input
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i));
            match choice {
                Some(option) => {
                    handle.select_answer(&question.id, &option.value).await?;
                    break;
                }
                None => println!("Enter a number between 1 and {}", question.options.len()),
            }
        }
    }

    match handle.submit_answers().await {
        Ok(()) => {
            println!("\nGenerating your PRD...");
            if let Some(tip) = handle.snapshot().current_tip {
                println!("  Tip: {}", tip);
            }
        }
        Err(e) if e.is_validation() => {}
        Err(e) => return Err(e.into()),
    }
    Ok(true)
}

async fn result_step(
    handle: &WorkflowHandle,
    lines: &mut InputLines,
    snapshot: &WorkflowSnapshot,
) -> Result<bool> {
    println!("\n{}", to_plain_text(&snapshot.document_nodes));

    loop {
        let Some(input) = prompt(handle, lines, "\n[c] copy  [n] new idea  [q] quit: ").await? else {
            return Ok(false);
        };

        match input.to_ascii_lowercase().as_str() {
            "c" => {
                // Outcome is reported as a notification
                let _ = handle.copy_document().await;
            }
            "n" => {
                handle.reset().await?;
                return Ok(true);
            }
            "q" => return Ok(false),
            _ => println!("Enter c, n or q"),
        }
    }
}

/// Read one trimmed line. `None` on end of input or when the workflow stopped.
async fn prompt(handle: &WorkflowHandle, lines: &mut InputLines, message: &str) -> Result<Option<String>> {
    print!("{}", message);
    std::io::stdout().flush()?;

    tokio::select! {
        line = lines.next_line() => Ok(line?.map(|l| l.trim().to_string())),
        _ = handle.closed() => Ok(None),
    }
}

/// Print workflow notifications and tips as they arrive
async fn forward_events(mut rx: broadcast::Receiver<WorkflowEvent>) {
    log::debug!("Event forwarder started");

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("Event forwarder skipped {} events", n);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event.event.as_str() {
            EVENT_NOTIFICATION => {
                if let Some(notification) = event.payload_as::<Notification>() {
                    print_notification(&notification);
                }
            }
            EVENT_TIP_ROTATED => {
                if let Some(payload) = event.payload_as::<TipRotatedPayload>() {
                    println!("  Tip: {}", payload.tip);
                }
            }
            EVENT_COUNTDOWN_EXPIRED | EVENT_PHASE_CHANGED => {
                log::debug!("{}: {}", event.event, event.payload);
            }
            _ => log::trace!("{}: {}", event.event, event.payload),
        }
    }

    log::debug!("Event forwarder stopped");
}

fn print_notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Success => println!("\n✓ {}", notification.message),
        NotificationLevel::Info => println!("\nℹ {}", notification.message),
        NotificationLevel::Error => eprintln!("\n✗ {}", notification.message),
    }
}
