// src/cli/repl.rs

// --- Imports ---
use crate::chat::ChatSession;
use crate::cli::commands::Command;
use crate::cli::helper::ReplHelper;
use crate::config::Config;
use crate::error::Result;
use crate::llm::openai::OpenAiClient;
use crate::llm::CompletionService;
use anyhow::Context;
use reqwest::Client;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::fs;
use std::io::{self, Write};
use tracing::{debug, error, info, warn};

// --- Constants ---
const PROMPT: &str = ">>> ";
const LOG_COLOR: &str = "\x1b[96m";
const COLOR_RESET: &str = "\x1b[00m";
const FAREWELL: &str = "\nGoodbye!\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

// --- Main REPL Function ---
pub async fn run_interactive(config: &Config, client: &Client) -> Result<()> {
    info!("Starting interactive chat session.");

    // --- Setup Rustyline Editor ---
    let helper = ReplHelper::new();
    let mut rl = Editor::<ReplHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(helper));
    let history_path = config.history_path();
    if let Some(parent) = history_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create history directory {:?}: {}", parent, e);
        }
    }
    if let Err(e) = rl.load_history(&history_path) {
        warn!("Failed to load command history from {:?}: {}", history_path, e);
    }
    // --- End Setup ---

    let mut session = ChatSession::new(OpenAiClient::new(client.clone(), config), config);

    print_initial_status(&session);

    // Cleanup below runs however the loop ends.
    let result = chat_loop(&mut rl, &mut session, config).await;

    // --- Save history ---
    if let Err(e) = rl.save_history(&history_path) {
        error!("Failed to save command history to {:?}: {}", history_path, e);
    }

    println!("{}", FAREWELL);
    info!("Exiting interactive chat session.");
    result
}

async fn chat_loop<S: CompletionService>(
    rl: &mut Editor<ReplHelper, DefaultHistory>,
    session: &mut ChatSession<S>,
    config: &Config,
) -> Result<()> {
    let mut stdout = io::stdout();

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        warn!("Failed to add line to history: {}", e);
                    }
                }

                tokio::select! {
                    flow = dispatch_line(&line, session, config, &mut stdout) => {
                        if flow? == Flow::Exit {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!("^C");
                        warn!("Interrupted while streaming, partial response discarded");
                        break;
                    }
                }
            }
            // Interrupt and end of input both end the session normally
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                error!("Readline error: {:?}", err);
                return Err(err).context("Failed to read input");
            }
        }
    }
    Ok(())
}

/// Handle one input line: skip it if blank, run it if it is a command,
/// otherwise send it as a chat line.
async fn dispatch_line<S: CompletionService, W: Write>(
    line: &str,
    session: &mut ChatSession<S>,
    config: &Config,
    out: &mut W,
) -> Result<Flow> {
    if line.trim().is_empty() {
        return Ok(Flow::Continue);
    }

    if let Some(command) = Command::parse(line) {
        debug!("Handling command: {:?}", command);
        return handle_command(command, session, config, out);
    }

    writeln!(out)?;
    match session.send(line, &mut *out).await {
        Ok(()) => writeln!(out, "\n")?,
        Err(e) => {
            // The turn is skipped; the session keeps going.
            error!("Completion failed: {:?}", e);
            eprintln!("\nError: {:#}\n", e);
        }
    }
    out.flush()?;
    Ok(Flow::Continue)
}

// --- Helper Functions ---

fn print_initial_status<S: CompletionService>(session: &ChatSession<S>) {
    println!("Model: {} ({} style)", session.params().model, session.style());
    println!("Type \"/help\" to see available commands.");
    println!();
}

// --- Command Handler ---
fn handle_command<S: CompletionService, W: Write>(
    command: Command,
    session: &mut ChatSession<S>,
    config: &Config,
    out: &mut W,
) -> Result<Flow> {
    match command {
        Command::Help => print_help(out)?,
        Command::Exit => return Ok(Flow::Exit),
        Command::Log => {
            let transcript = session.transcript();
            if transcript.is_empty() {
                writeln!(out, "\nempty\n")?;
            } else {
                writeln!(out, "\n{}{}{}\n", LOG_COLOR, transcript.render_log(), COLOR_RESET)?;
            }
        }
        Command::Stats => {
            let stats = session.transcript().stats();
            writeln!(out, "\nturns: {}", stats.count)?;
            writeln!(out, "chars: {}", stats.char_length)?;
            writeln!(out, "bytes: {}\n", stats.byte_length)?;
        }
        Command::Save => match session.transcript().persist(&config.log_dir()) {
            Ok(path) => writeln!(out, "\nsaved: {}\n", path.display())?,
            Err(e) => {
                error!("Failed to save transcript: {:?}", e);
                eprintln!("\nError: {:#}\n", e);
            }
        },
        Command::Clear => {
            session.transcript_mut().clear();
            writeln!(out, "\ncleared\n")?;
        }
        Command::Forget => {
            let transcript = session.transcript_mut();
            transcript.remove_last_turn();
            if let Some(turn) = transcript.last_turn() {
                writeln!(out, "\n{}\n", turn.completion)?;
            }
        }
        Command::Context => writeln!(out, "\n{}\n", session.transcript().context())?,
    }
    out.flush()?;
    Ok(Flow::Continue)
}

// --- Help Command ---
fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    for command in Command::ALL {
        writeln!(out, "{:<9} - {}", command.token(), command.description())?;
    }
    writeln!(out)?;
    writeln!(out, "Ctrl+C or Ctrl+D also exits. Set OPENAI_API_KEY in the environment or a .env file.")?;
    writeln!(out)
}
