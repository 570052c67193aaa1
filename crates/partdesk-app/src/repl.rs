//! Interactive session over stdin.

use std::io::Write;

use partdesk_chat::{ChatReply, ContextStore, Orchestrator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "Commands: /history, /slots, /reset, /quit. Anything else is sent as a message.";

/// One line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    History,
    Slots,
    Reset,
    Help,
    Quit,
    Message(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/history" => Command::History,
            "/slots" => Command::Slots,
            "/reset" => Command::Reset,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Message(other),
        }
    }
}

/// Render a reply for the terminal.
pub fn render(reply: &ChatReply, json: bool) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(reply)
    } else {
        Ok(format!("[{}] {}", reply.agent, reply.text))
    }
}

/// Read lines until EOF or `/quit`, answering each through `orchestrator`.
pub async fn run(
    orchestrator: &Orchestrator,
    store: &mut ContextStore,
    session_id: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Session {}. {}", session_id, HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Reset => {
                store.reset(session_id);
                println!("Conversation cleared.");
            }
            Command::History => match store.history(session_id) {
                Ok(turns) => {
                    for turn in turns {
                        println!("{:?}: {}", turn.role, turn.text);
                    }
                }
                Err(e) => println!("{}", e),
            },
            Command::Slots => {
                if let Some(ctx) = store.get(session_id) {
                    let mut slots: Vec<_> = ctx.slots().iter().collect();
                    slots.sort();
                    for (key, value) in slots {
                        println!("{} = {}", key, value);
                    }
                }
            }
            Command::Message(text) => {
                let reply = orchestrator
                    .handle_message(text, store.session_mut(session_id))
                    .await;
                println!("{}", render(&reply, json)?);
            }
        }
    }

    info!(session = %session_id, turns = store.get(session_id).map_or(0, |c| c.len()), "Session ended");
    Ok(())
}
