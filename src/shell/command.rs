use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};

/// One line typed into the shell.
#[derive(Debug, Parser)]
#[command(
    name = "docindex",
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ShellCommand {
    /// Sign in
    Login { username: String, password: String },
    /// Sign out
    Logout,
    /// Create an account
    Register { username: String, password: String },
    /// Show who the server thinks you are
    Whoami,
    /// Show the current page of documents
    #[command(alias = "ls")]
    List,
    /// Refetch the current page
    Refresh,
    /// Go to the first page
    First,
    /// Go to the previous page
    #[command(alias = "prev")]
    Previous,
    /// Go to the next page
    Next,
    /// Go to the last page
    Last,
    /// Go to a page by number (1-based)
    Goto { page: String },
    /// Change the number of rows per page
    Size { size: u32 },
    /// Upload one file
    Upload { paths: Vec<PathBuf> },
    /// Delete a document by id
    #[command(alias = "rm")]
    Delete { id: i64 },
    /// Start processing a document by id
    Process { id: i64 },
    /// Save a document from the current page to disk
    Download {
        id: i64,
        /// Target file (default: the document's name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List commands
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Parse a raw line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, clap::Error> {
    let words = split_words(line);
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

pub fn help_text() -> String {
    ShellLine::command().render_help().to_string()
}

/// Whitespace-separated words; single or double quotes group a word.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
