//! Interactive kiosk loop on the terminal.
//!
//! Each line on stdin is one operator command. A bare `c` or `b` prompts
//! for the code on the next line, the way a wedge reader types a scan
//! followed by Enter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use climbcontest_client::{
    CodeFormat, Kiosk, KioskHandle, ScanOutcome, ScanStatus, Scanner, Transport,
};
use climbcontest_core::{
    IgnoreReason, KioskEvent, PairingSession, PairingSlot, ResetScope, SessionStatus,
    ValidationFailure,
};
use climbcontest_types::Category;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::config::KioskSettings;

const HELP: &str = "\
commands:
  c [id]     scan climber (prompts for the code when no id is given)
  b [id]     scan bloc
  s          submit the pair (manual mode, or retry after a failure)
  r          reset the session
  a on|off   toggle auto-evaluate
  p          print the session
  h          this help
  q          quit";

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Scan(Category, Option<String>),
    Submit,
    Reset,
    AutoEvaluate(bool),
    Print,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let rest: Vec<&str> = parts.collect();
    let arg = (!rest.is_empty()).then(|| rest.join(" "));

    match head.to_ascii_lowercase().as_str() {
        "c" | "climber" => Ok(Command::Scan(Category::Climber, arg)),
        "b" | "bloc" => Ok(Command::Scan(Category::Bloc, arg)),
        "s" | "submit" => Ok(Command::Submit),
        "r" | "reset" => Ok(Command::Reset),
        "a" | "auto" => match arg.as_deref() {
            Some("on") => Ok(Command::AutoEvaluate(true)),
            Some("off") => Ok(Command::AutoEvaluate(false)),
            _ => Err("usage: a on|off".to_string()),
        },
        "p" | "print" => Ok(Command::Print),
        "h" | "help" | "?" => Ok(Command::Help),
        "q" | "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}' (h for help)", other)),
    }
}

/// Reads scans from the terminal, sharing stdin with the command loop.
struct TerminalScanner {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalScanner {
    fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn next_line(&self) -> std::io::Result<Option<String>> {
        self.lines.lock().await.next_line().await
    }
}

#[async_trait]
impl Scanner for TerminalScanner {
    async fn scan(&self, format: CodeFormat) -> ScanOutcome {
        match format {
            CodeFormat::QrCode => println!("scan QR code (empty line cancels):"),
            CodeFormat::Any => println!("scan code (empty line cancels):"),
        }
        match self.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => ScanOutcome::Cancelled,
            Ok(Some(line)) => ScanOutcome::Scanned(line),
            Ok(None) => ScanOutcome::Cancelled,
            Err(e) => ScanOutcome::Failed(e.to_string()),
        }
    }
}

/// Operator-facing text for an event, if it should be shown.
fn describe(event: &KioskEvent) -> Option<String> {
    let text = match event {
        KioskEvent::Confirmed { category, entry } => {
            format!("[ok] {}: {}", category, entry.label())
        }
        KioskEvent::NotConfirmed {
            category,
            id,
            failure: ValidationFailure::Rejected,
        } => format!("[!!] {} {} is not registered, scan again", category, id),
        KioskEvent::NotConfirmed {
            category,
            failure: ValidationFailure::Unreachable(reason),
            ..
        } => format!("[!!] could not check {}: {}", category, reason),
        KioskEvent::SubmissionStarted => "submitting...".to_string(),
        KioskEvent::Registered => "[ok] REGISTERED".to_string(),
        KioskEvent::SubmissionFailed { result } => {
            format!("[!!] submission failed: {} (s to retry, r to reset)", result)
        }
        KioskEvent::SessionReset {
            scope: ResetScope::Full,
        } => "ready: scan climber".to_string(),
        KioskEvent::SessionReset {
            scope: ResetScope::BlocOnly,
        } => "ready: scan next bloc (climber kept)".to_string(),
        KioskEvent::ScanIgnored {
            category,
            reason: IgnoreReason::AlreadyConfirmed,
        } => format!("{} already confirmed (r to reset)", category),
        KioskEvent::ScanIgnored {
            category,
            reason: IgnoreReason::ResolveInFlight,
        } => format!("{} is still being checked", category),
        KioskEvent::StaleResponse { .. } => return None,
    };
    Some(text)
}

fn slot_label(slot: &PairingSlot) -> String {
    match slot {
        PairingSlot::Empty => "-".to_string(),
        PairingSlot::Pending(id) => format!("{} (checking)", id),
        PairingSlot::Confirmed(entry) => format!("{} [{}]", entry.label(), entry.id),
    }
}

fn print_session(session: &PairingSession) {
    let status = match session.status() {
        SessionStatus::Incomplete => "incomplete",
        SessionStatus::Ready => "ready",
        SessionStatus::Submitting => "submitting",
        SessionStatus::Completed => "registered",
    };
    println!("climber: {}", slot_label(session.slot(Category::Climber)));
    println!("bloc:    {}", slot_label(session.slot(Category::Bloc)));
    println!("status:  {}", status);
}

async fn print_events(mut events: broadcast::Receiver<KioskEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(text) = describe(&event) {
                    println!("{}", text);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!("event printer skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn scan(
    kiosk: &KioskHandle,
    scanner: &TerminalScanner,
    category: Category,
    code: Option<String>,
) {
    let result = match code {
        Some(code) => kiosk.scanned(category, &code).map(ScanStatus::Submitted),
        None => kiosk.scan(category, scanner).await,
    };
    match result {
        Ok(ScanStatus::Submitted(id)) => println!("checking {} {}...", category, id),
        Ok(ScanStatus::SlotBusy) => println!("{} already scanned (r to reset)", category),
        Ok(ScanStatus::Cancelled) => println!("scan cancelled"),
        Ok(ScanStatus::Failed(reason)) => println!("[!!] scan failed: {}", reason),
        Err(e) => println!("[!!] {}", e),
    }
}

/// Run the interactive kiosk.
pub async fn run<T: Transport + 'static>(
    data_dir: &Path,
    mut settings: KioskSettings,
    transport: T,
) -> Result<()> {
    let kiosk = Kiosk::spawn(settings.kiosk_config(), transport);
    let printer = tokio::spawn(print_events(kiosk.subscribe()));
    let scanner = TerminalScanner::new();

    println!("kiosk ready on {} ({})", settings.server, settings.api_version);
    println!("{}", HELP);

    while let Some(line) = scanner
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Scan(category, code) => scan(&kiosk, &scanner, category, code).await,
            Command::Submit => match kiosk.snapshot().status() {
                SessionStatus::Ready => kiosk.submit()?,
                SessionStatus::Incomplete => println!("scan both climber and bloc first"),
                SessionStatus::Submitting | SessionStatus::Completed => {
                    println!("already submitted")
                }
            },
            Command::Reset => kiosk.reset()?,
            Command::AutoEvaluate(enabled) => {
                settings.auto_evaluate = enabled;
                settings.save(data_dir).await?;
                kiosk.update_settings(settings.session_config())?;
            }
            Command::Print => print_session(&kiosk.snapshot()),
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    drop(kiosk);
    printer.abort();
    Ok(())
}
