//! `haggle inbox <user-id>`: print a user's conversation list.

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use haggle_types::conversation::ConversationSummary;

use crate::state::AppState;

/// Longest preview shown in the table, in characters.
const PREVIEW_CHARS: usize = 40;

pub async fn show_inbox(
    state: &AppState,
    user_id: &Uuid,
    limit: Option<u32>,
    json: bool,
) -> Result<()> {
    let summaries = state
        .chat_service
        .list_conversations(user_id, limit, 0)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!();
        println!("  {}", style("No conversations yet.").dim());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Item").fg(Color::White),
        Cell::new("With").fg(Color::White),
        Cell::new("Last Message").fg(Color::White),
        Cell::new("Unread").fg(Color::White),
        Cell::new("Active").fg(Color::White),
    ]);

    for summary in &summaries {
        let unread = if summary.unread_count > 0 {
            Cell::new(summary.unread_count).fg(Color::Green)
        } else {
            Cell::new("0").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(item_label(summary)),
            Cell::new(counterpart_label(summary)),
            Cell::new(preview(summary)),
            unread,
            Cell::new(format_relative_time(&summary.activity_at(), &Utc::now())),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

fn item_label(summary: &ConversationSummary) -> String {
    if summary.item_title.is_empty() {
        "(general)".to_string()
    } else {
        summary.item_title.clone()
    }
}

fn counterpart_label(summary: &ConversationSummary) -> String {
    match &summary.counterpart {
        Some(c) => c
            .display_name
            .clone()
            .unwrap_or_else(|| c.user_id.to_string()),
        None => "-".to_string(),
    }
}

fn preview(summary: &ConversationSummary) -> String {
    let Some(last) = &summary.last_message else {
        return String::new();
    };
    if last.content.chars().count() <= PREVIEW_CHARS {
        return last.content.clone();
    }
    let cut: String = last.content.chars().take(PREVIEW_CHARS - 1).collect();
    format!("{cut}…")
}

fn format_relative_time(at: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let secs = (*now - *at).num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
