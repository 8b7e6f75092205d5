// src/cli/commands.rs

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Log,
    Stats,
    Save,
    Clear,
    Forget,
    Context,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Help,
        Command::Exit,
        Command::Log,
        Command::Stats,
        Command::Save,
        Command::Clear,
        Command::Forget,
        Command::Context,
    ];

    /// Exact, case-sensitive match of the whole line.
    pub fn parse(line: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.token() == line)
    }

    pub fn token(&self) -> &'static str {
        match self {
            Command::Help => "/help",
            Command::Exit => "/exit",
            Command::Log => "/log",
            Command::Stats => "/stats",
            Command::Save => "/save",
            Command::Clear => "/clear",
            Command::Forget => "/forget",
            Command::Context => "/context",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Help => "view available commands",
            Command::Exit => "exit the program",
            Command::Log => "view the current conversation log",
            Command::Stats => "show turn count and log size",
            Command::Save => "save the conversation log to a file",
            Command::Clear => "clear all the conversation log",
            Command::Forget => "cancel the previous exchange",
            Command::Context => "show the current chat context",
        }
    }
}
