//! bookline chat client: the visitor-facing terminal surface.
//!
//! Free text is sent through the booking flow; `/` commands drive the
//! calendar and the payment affordance. Live slot/booking updates are
//! observed over the push channel (informational on this surface).

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use bookline::chat::{ChatItem, ChatSession, ChatView, DayCell, MonthGrid, Role, TimeList};
use bookline::push::{NdjsonTransport, PushChannel};
use bookline::start_bookline::{self, CHAT_STREAM_PATH};

fn main() -> ExitCode {
    start_bookline::run_surface(run)
}

async fn run() -> anyhow::Result<()> {
    let backend = start_bookline::backend_from_env()?;
    let mut session = ChatSession::new(backend.clone());

    // One push subscription per process; loss is logged, never retried here.
    let channel = Arc::new(PushChannel::new());
    let mut updates = channel.subscribe();
    match backend.config().endpoint(CHAT_STREAM_PATH) {
        Ok(url) => match NdjsonTransport::connect(backend.client(), url).await {
            Ok(transport) => {
                let pump = Arc::clone(&channel);
                tokio::spawn(async move { pump.pump(transport).await });
            }
            Err(err) => tracing::warn!("live updates unavailable: {err}"),
        },
        Err(err) => tracing::warn!("live updates unavailable: {err}"),
    }

    println!("bookline — type a message, or:");
    println!("  /quick | /prev | /next | /day <date> | /time <date> <hh:mm> | /pay <booking> | /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input == "/quit" {
                    break;
                }
                if !handle_command(&mut session, input).await {
                    session.submit(input).await;
                }
                print_view(&session.render(today()));
            }
            update = updates.recv() => {
                if let Ok(update) = update {
                    session.observe_update(&update);
                }
            }
        }
    }
    Ok(())
}

/// Handle a `/` command; returns false for plain chat input.
async fn handle_command(session: &mut ChatSession, input: &str) -> bool {
    let mut parts = input.split_whitespace();
    match parts.next() {
        Some("/quick") => {
            session.quick_ask().await;
            true
        }
        Some("/prev") => {
            session.calendar_prev();
            true
        }
        Some("/next") => {
            session.calendar_next();
            true
        }
        Some("/day") => {
            if let Some(date) = parts.next() {
                session.select_date(date);
            }
            true
        }
        Some("/time") => {
            if let (Some(date), Some(time)) = (parts.next(), parts.next()) {
                session.select_time(date, time).await;
            }
            true
        }
        Some("/pay") => {
            if let Some(booking_id) = parts.next() {
                if let Some(url) = session.start_payment(booking_id).await {
                    println!("Redirecting to checkout: {url}");
                }
            }
            true
        }
        _ => false,
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn print_view(view: &ChatView) {
    println!();
    for item in &view.items {
        match item {
            ChatItem::Message { role, text } => {
                let who = match role {
                    Role::User => "you",
                    Role::Assistant => "assistant",
                };
                println!("{who:>9}: {text}");
            }
            ChatItem::Loading => println!("           ..."),
            ChatItem::Calendar { grid, times } => print_calendar(grid, times.as_ref()),
            ChatItem::PayButton { booking_id } => {
                println!("  [Pay now]  (/pay {booking_id})");
            }
        }
    }
    if view.show_suggestions {
        println!("  suggestion: /quick  (\"{}\")", bookline::chat::QUICK_SUGGESTION);
    }
}

fn print_calendar(grid: &MonthGrid, times: Option<&TimeList>) {
    println!("  {}  (/prev, /next)", grid.label);
    println!("   Sun  Mon  Tue  Wed  Thu  Fri  Sat");
    for week in &grid.weeks {
        let mut row = String::new();
        for cell in week {
            match cell {
                DayCell::Blank => row.push_str("     "),
                DayCell::Day {
                    day,
                    bookable,
                    today,
                    ..
                } => {
                    let mark = if *today {
                        '!'
                    } else if *bookable {
                        '*'
                    } else {
                        ' '
                    };
                    row.push_str(&format!(" {day:>3}{mark}"));
                }
            }
        }
        println!(" {row}");
    }
    println!("  * bookable (/day <date>)    ! today");
    if let Some(list) = times {
        println!(
            "  {}: {}    (/time {} <hh:mm>)",
            list.date,
            list.times.join("  "),
            list.date
        );
    }
}
