// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A parsed, validated command typed at the interactive prompt.
///
/// Commands start with `:`; every other line is a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Leave interactive mode
    Quit,
    // Print the tree of a record and push it onto the history
    Show(String),
    // Print forward and back references of a record
    Refs(String),
    // Print the component types embedded in a record
    Components(String),
    // Set the tree filter and re-show the current record; empty clears it
    Filter(String),
    // Pop the history and re-show the previous record
    Back,
    // Print the load summary
    Stats,
}

impl Command {
    /// Parse a raw command string (the text after the `:` prefix).
    ///
    /// Returns `Ok(cmd)` on success, `Err(message)` on failure. An empty
    /// string returns `Err("")` as a sentinel meaning "do nothing".
    pub fn parse(input: &str) -> Result<Command, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(String::new());
        }

        let (word, rest) = input
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((input, ""));

        let target = |usage: &str| {
            if rest.is_empty() {
                Err(format!("usage: {usage} <guid|name>"))
            } else {
                Ok(rest.to_string())
            }
        };

        match word {
            "q" | "quit" => Ok(Command::Quit),
            "show" | "s" => target("show").map(Command::Show),
            "refs" | "r" => target("refs").map(Command::Refs),
            "components" | "c" => target("components").map(Command::Components),
            "filter" | "f" => Ok(Command::Filter(rest.to_string())),
            "back" | "b" => Ok(Command::Back),
            "stats" => Ok(Command::Stats),
            other => Err(format!("unknown command: {other}")),
        }
    }
}
