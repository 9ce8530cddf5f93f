//! bookline-dashboard: the operator terminal surface.
//!
//! Tables mirror server-side truth: an initial fetch, then full re-renders
//! on every push snapshot. Mutation commands go straight to the backend and
//! never patch the tables locally; the visible change arrives with the next
//! push.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use bookline::dashboard::{alert_message, DashboardSession};
use bookline::push::{NdjsonTransport, PushChannel};
use bookline::start_bookline::{self, DASHBOARD_STREAM_PATH};
use bookline::view::TableView;

fn main() -> ExitCode {
    start_bookline::run_surface(run)
}

async fn run() -> anyhow::Result<()> {
    let backend = start_bookline::backend_from_env()?;
    let mut session = DashboardSession::new(backend.clone());
    session.initial_load().await;

    let channel = Arc::new(PushChannel::new());
    let mut updates = channel.subscribe();
    match backend.config().endpoint(DASHBOARD_STREAM_PATH) {
        Ok(url) => match NdjsonTransport::connect(backend.client(), url).await {
            Ok(transport) => {
                let pump = Arc::clone(&channel);
                tokio::spawn(async move { pump.pump(transport).await });
            }
            Err(err) => tracing::warn!("live updates unavailable: {err}"),
        },
        Err(err) => tracing::warn!("live updates unavailable: {err}"),
    }

    render(&session);
    println!("commands: add <date> <time> | del <date> <time> | cancel <id> | paid <id> | show | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "quit" {
                    break;
                }
                handle_command(&session, input).await;
            }
            update = updates.recv() => {
                if let Ok(update) = update {
                    session.apply_update(update);
                    render(&session);
                }
            }
        }
    }
    Ok(())
}

/// Dispatch one operator command.
async fn handle_command(session: &DashboardSession, input: &str) {
    let mut parts = input.split_whitespace();
    let command = parts.next();
    let first = parts.next();
    let second = parts.next();

    match (command, first, second) {
        (Some("add"), Some(date), Some(time)) => {
            if let Err(err) = session.create_slot(date, time).await {
                alert(&alert_message("add slot", &err));
            }
        }
        (Some("del"), Some(date), Some(time)) => {
            if let Err(err) = session.delete_slot(date, time).await {
                alert(&alert_message("delete slot", &err));
            }
        }
        (Some("cancel"), Some(id), None) => {
            if let Err(err) = session.cancel_booking(id).await {
                alert(&alert_message("cancel booking", &err));
            }
        }
        (Some("paid"), Some(id), None) => {
            if let Err(err) = session.mark_paid(id).await {
                alert(&alert_message("mark booking paid", &err));
            }
        }
        (Some("show"), None, None) => render(session),
        _ => println!("unrecognized command: {input}"),
    }
}

/// Blocking, user-visible failure notice naming the operation.
fn alert(message: &str) {
    println!();
    println!("[ALERT] {message}");
}

fn render(session: &DashboardSession) {
    print_table("Slots", &session.slots_view());
    print_table("Bookings", &session.bookings_view());
    if let Some(at) = session.last_updated() {
        println!("Last updated: {}", at.format("%H:%M:%S"));
    }
}

fn print_table(title: &str, table: &TableView) {
    println!();
    println!("== {title} ==");
    println!("{}", table.columns.join(" | "));
    for row in &table.rows {
        let actions: Vec<&str> = row.actions.iter().map(|button| button.label).collect();
        if actions.is_empty() {
            println!("{}", row.cells.join(" | "));
        } else {
            println!("{} | [{}]", row.cells.join(" | "), actions.join("] ["));
        }
    }
}
