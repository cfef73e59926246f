//! Terminal stand-in for a chat client.
//!
//! Each render is printed with numbered buttons. Typing a number taps the
//! button, `/name` sends a command and anything else is sent as free text.

use super::ui;
use crate::core::session::SessionId;
use crate::core::{Button, Render, Router};
use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const LOCAL_SESSION: SessionId = 0;

/// A line typed by the user, resolved against the buttons on screen.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Tap(&'a str),
    Command(&'a str),
    Text(&'a str),
    Quit,
}

fn parse_input<'a>(line: &'a str, buttons: &'a [Button]) -> Input<'a> {
    let line = line.trim();
    if let Ok(n) = line.parse::<usize>() {
        if let Some(button) = n.checked_sub(1).and_then(|i| buttons.get(i)) {
            return Input::Tap(&button.token);
        }
    }
    match line.strip_prefix('/') {
        Some("quit" | "exit") => Input::Quit,
        Some(command) => Input::Command(command),
        None => Input::Text(line),
    }
}

fn print_render(render: &Render) {
    println!("\n{}", render.text);
    if render.buttons.is_empty() {
        return;
    }
    println!();
    for (i, button) in render.buttons.iter().enumerate() {
        println!("  {} {}", style(format!("[{}]", i + 1)).cyan().bold(), button.label);
    }
}

pub async fn run(router: &Router) -> Result<()> {
    println!(
        "{}",
        ui::style_text(
            "Type a number to press a button, /start for the menu, /quit to leave.",
            ui::StyleType::Subtle
        )
    );

    let mut render = router.start(LOCAL_SESSION).await;
    print_render(&render);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let next = match parse_input(&line, &render.buttons) {
            Input::Quit => break,
            Input::Tap(token) => {
                debug!(token, "Button pressed");
                router.handle_action(LOCAL_SESSION, token).await
            }
            Input::Command(command) => router.handle_command(LOCAL_SESSION, command).await,
            Input::Text(text) => router.handle_text(LOCAL_SESSION, text).await,
        };
        render = next;
        print_render(&render);
    }

    Ok(())
}
