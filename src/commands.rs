//! Command palette entries and autocomplete ranking.

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "todos",
    aliases: &["t", "list", "home"],
    description: "Back to the todo list",
  },
  Command {
    name: "add",
    aliases: &["a", "new", "create"],
    description: "Create a todo",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    description: "Re-fetch todos from the server",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit todo-tui",
  },
];

/// Match quality of `input` against a command, lower is better
fn rank(cmd: &Command, input: &str) -> Option<u32> {
  if cmd.name == input {
    Some(0)
  } else if cmd.aliases.contains(&input) {
    Some(1)
  } else if cmd.name.starts_with(input) {
    Some(2)
  } else if cmd.aliases.iter().any(|a| a.starts_with(input)) {
    Some(3)
  } else if cmd.name.contains(input) {
    Some(4)
  } else if cmd.aliases.iter().any(|a| a.contains(input)) {
    Some(5)
  } else {
    None
  }
}

/// Get autocomplete suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input = input.trim().to_lowercase();

  if input.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&'static Command, u32)> = COMMANDS
    .iter()
    .filter_map(|cmd| rank(cmd, &input).map(|r| (cmd, r)))
    .collect();

  // Stable sort keeps declaration order among equal ranks
  matches.sort_by_key(|(_, r)| *r);
  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
