//! Line-oriented driver for the ritual engine.
//!
//! Not a rendering layer in any serious sense: it exists so the session
//! state machine, the identity manager, and the reporter can be exercised
//! end to end from a terminal. Ticks come from a 1-second interval, user
//! events from stdin, both multiplexed on one task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use ritual_core::Clock;
use ritual_core::model::ScoreReport;
use ritual_core::time::format_seconds;
use services::{
    ApiConfig, CountdownKind, HostBridge, RitualApi, RitualService, RitualSession, SessionPhase,
    SessionView,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    api_url: Option<String>,
    user_id: Option<String>,
    count: usize,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--api <base_url>] [--user <id>] [--count <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --count {}", services::SESSION_LENGTH);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RITUAL_API_URL, RITUAL_USER_ID, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url = std::env::var("RITUAL_API_URL").ok();
        let mut user_id = std::env::var("RITUAL_USER_ID").ok();
        let mut count = services::SESSION_LENGTH;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api_url = Some(require_value(args, "--api")?),
                "--user" => user_id = Some(require_value(args, "--user")?),
                "--count" => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .parse()
                        .ok()
                        .filter(|n: &usize| *n > 0)
                        .ok_or(ArgsError::InvalidCount { raw: value })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api_url,
            user_id,
            count,
        })
    }
}

/// Host bridge for a bare terminal: identity comes from the command line,
/// everything else is absent.
struct TerminalHost {
    user_id: Option<String>,
}

impl HostBridge for TerminalHost {
    fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

fn render(view: &SessionView) {
    match view.phase {
        SessionPhase::Presenting => {
            println!();
            println!(
                "── Question {}/{} · {} {}",
                view.position + 1,
                view.total,
                view.domain,
                if view.signature { "✦" } else { "" }
            );
            println!("{}", view.question);
            for (display, option) in view.options.iter().enumerate() {
                let letter = char::from(b'a' + display as u8);
                println!("  {letter}) {option}");
            }
            if let Some(count) = view.correct_so_far {
                println!("  [{count} correct so far]");
            }
            println!("(a-d selects, Enter confirms)");
        }
        SessionPhase::Reading => {
            if let Some(verdict) = &view.verdict {
                println!();
                match &verdict.selected_text {
                    Some(text) => println!("Your answer: {} — {text}", verdict.selected_letter),
                    None => println!("Your answer: — (time ran out)"),
                }
                println!("Outcome: {}", verdict.status);
                println!(
                    "Expected: {} — {}",
                    verdict.correct_letter, verdict.correct_text
                );
                if let Some(explanation) = &verdict.explanation {
                    println!("{explanation}");
                }
                println!("(Enter continues)");
            }
        }
        SessionPhase::Finished => {}
    }
}

fn render_countdown(view: &SessionView) {
    if let (Some(kind), Some(remaining)) = (view.countdown_kind, view.countdown_remaining) {
        // A full redraw every second would drown the terminal; surface the
        // clock at coarse marks and during the final stretch.
        if remaining > 0 && (remaining % 15 == 0 || remaining <= 5) {
            let label = match kind {
                CountdownKind::Answer => "Time",
                CountdownKind::Reading => "Reading",
            };
            println!("  {label} · {}", format_seconds(u64::from(remaining)));
        }
    }
}

fn render_unavailable() {
    println!();
    println!("The ritual is momentarily unavailable.");
    println!("We cannot open this session right now.");
    println!("(Enter retries, q quits)");
}

fn render_result(report: &ScoreReport) {
    println!();
    println!("── Ritual complete");
    println!(
        "Score: {} / {} in {}",
        report.score(),
        report.total(),
        format_seconds(report.time_total_seconds())
    );
}

/// Applies one line of input to the session; returns false on quit.
fn apply_input(session: &mut RitualSession, line: &str) -> bool {
    let line = line.trim();
    match session.phase() {
        SessionPhase::Presenting => match line {
            "" => {
                if session.confirm() {
                    render(&session.view());
                }
            }
            "q" => return false,
            choice => {
                let display = choice
                    .bytes()
                    .next()
                    .filter(|b| (b'a'..=b'd').contains(b))
                    .map(|b| usize::from(b - b'a'));
                match display {
                    Some(display) => {
                        if session.select(display).is_ok() {
                            println!("  selected {choice}");
                        }
                    }
                    None => println!("  (a-d selects, Enter confirms)"),
                }
            }
        },
        SessionPhase::Reading => {
            if line == "q" {
                return false;
            }
            session.advance();
            render(&session.view());
        }
        SessionPhase::Finished => {}
    }
    true
}

/// Drives a started session to its end; returns false if the user quit.
async fn drive(
    session: &mut RitualSession,
    lines: &mut Lines<BufReader<Stdin>>,
    host: &dyn HostBridge,
) -> bool {
    render(&session.view());

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick of a tokio interval completes immediately.
    interval.tick().await;

    let mut last_phase = session.phase();
    let mut last_cursor = session.cursor();
    while !session.is_finished() {
        tokio::select! {
            _ = interval.tick() => {
                session.tick();
                let view = session.view();
                if session.phase() != last_phase || session.cursor() != last_cursor {
                    render(&view);
                } else {
                    render_countdown(&view);
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !apply_input(session, &line) {
                            return false;
                        }
                    }
                    // Stdin closed: let the countdowns finish the ritual.
                    Ok(None) => tokio::time::sleep(Duration::from_millis(50)).await,
                    Err(_) => return false,
                }
            }
        }

        let phase = session.phase();
        if phase == SessionPhase::Reading
            && last_phase != SessionPhase::Reading
            && services::is_signature_position(session.cursor())
        {
            host.haptic_pulse();
        }
        last_phase = phase;
        last_cursor = session.cursor();
    }
    true
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = ApiConfig::resolve(args.api_url.as_deref());
    let api = Arc::new(RitualApi::new(config));
    let host = Arc::new(TerminalHost {
        user_id: args.user_id.clone(),
    });
    let mut service = RitualService::new(
        api.clone(),
        api.clone(),
        api,
        host,
        Clock::default_clock(),
    )
    .with_question_count(args.count);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Fatal batch failures land in the unavailable state, which offers only
    // a reload. Everything degraded continues silently.
    let mut session = loop {
        println!("Preparing the ritual…");
        match service.begin().await {
            Ok(session) => break session,
            Err(err) => {
                tracing::warn!(error = %err, "ritual could not start");
                render_unavailable();
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim() != "q" => continue,
                    _ => return Ok(()),
                }
            }
        }
    };

    let host = service.host();
    if !drive(&mut session, &mut lines, host.as_ref()).await {
        println!("Ritual abandoned.");
        return Ok(());
    }

    let Some(report) = session.report().cloned() else {
        return Ok(());
    };
    render_result(&report);

    println!();
    println!("Leave a word before you go:");
    let feedback = match lines.next_line().await {
        Ok(Some(line)) => line,
        _ => String::new(),
    };

    let mut reporter = service.complete(&report, &feedback).await;
    let mut outcome = reporter.submit().await;
    if !outcome.http_sent {
        // Mirror of the close-time fallback: one more chance for a channel
        // that failed, skipping whatever already went through.
        println!("Report delivery incomplete. Enter retries, anything else quits.");
        if let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                outcome = reporter.submit().await;
            }
        }
    }

    if outcome.http_sent {
        println!("Your passage is recorded.");
    } else {
        println!("The report will stay local this time.");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
