// Command abbreviation matching for the benchboard CLI

/// Find all commands that start with the given prefix (case-insensitive)
pub fn find_matching_commands<'a>(prefix: &str, commands: &'a [&str]) -> Vec<&'a str> {
    let prefix_lower = prefix.to_lowercase();
    commands.iter()
        .filter(|cmd| cmd.to_lowercase().starts_with(&prefix_lower))
        .copied()
        .collect()
}

/// Find a unique command match for the given prefix
/// Returns Ok(command) if exactly one match, Err(matches) if ambiguous, Err(empty) if no match
/// Exact matches take precedence over prefix matches
pub fn find_unique_command<'a>(prefix: &str, commands: &'a [&str]) -> Result<&'a str, Vec<&'a str>> {
    let prefix_lower = prefix.to_lowercase();
    for cmd in commands {
        if cmd.to_lowercase() == prefix_lower {
            return Ok(*cmd);
        }
    }

    let matches = find_matching_commands(prefix, commands);
    match matches.len() {
        0 => Err(Vec::new()),
        1 => Ok(matches[0]),
        _ => Err(matches),
    }
}

/// Top-level commands
pub const TOP_LEVEL_COMMANDS: &[&str] = &[
    "board", "show", "move", "capacity", "metrics", "calendar", "export", "stages", "sample", "help",
];

/// Stages subcommands
pub const STAGES_COMMANDS: &[&str] = &[
    "list", "add", "rename", "reorder", "remove", "restore", "limit", "reset",
];

/// Global options that take a value and may precede the command
const GLOBAL_VALUE_FLAGS: &[&str] = &["--orders"];

/// Get subcommands for a given top-level command
pub fn get_subcommands(command: &str) -> Option<&'static [&'static str]> {
    match command {
        "stages" => Some(STAGES_COMMANDS),
        _ => None,
    }
}

/// Expand command abbreviations in argument list
/// Returns expanded args or error message
pub fn expand_command_abbreviations(args: Vec<String>) -> Result<Vec<String>, String> {
    // Skip leading global options to find the command word
    let mut cmd_idx = 0;
    while cmd_idx < args.len() && args[cmd_idx].starts_with('-') {
        if GLOBAL_VALUE_FLAGS.contains(&args[cmd_idx].as_str()) {
            cmd_idx += 1;
        }
        cmd_idx += 1;
    }
    if cmd_idx >= args.len() {
        return Ok(args);
    }

    let mut expanded = args;
    let full_cmd = match find_unique_command(&expanded[cmd_idx], TOP_LEVEL_COMMANDS) {
        Ok(cmd) => cmd,
        // No match: let clap report it
        Err(matches) if matches.is_empty() => return Ok(expanded),
        Err(matches) => {
            return Err(format!(
                "Ambiguous command '{}'. Did you mean one of: {}?",
                expanded[cmd_idx],
                matches.join(", ")
            ));
        }
    };
    expanded[cmd_idx] = full_cmd.to_string();

    if let Some(subcommands) = get_subcommands(full_cmd) {
        let sub_idx = cmd_idx + 1;
        if sub_idx < expanded.len() && !expanded[sub_idx].starts_with('-') {
            match find_unique_command(&expanded[sub_idx], subcommands) {
                Ok(sub) => expanded[sub_idx] = sub.to_string(),
                Err(matches) if matches.is_empty() => {}
                Err(matches) => {
                    return Err(format!(
                        "Ambiguous subcommand '{}'. Did you mean one of: {}?",
                        expanded[sub_idx],
                        matches.join(", ")
                    ));
                }
            }
        }
    }

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_unique_command() {
        assert_eq!(find_unique_command("cap", TOP_LEVEL_COMMANDS), Ok("capacity"));
        assert_eq!(find_unique_command("BOARD", TOP_LEVEL_COMMANDS), Ok("board"));
        assert!(find_unique_command("xyz", TOP_LEVEL_COMMANDS).unwrap_err().is_empty());
        // "s" matches show, stages, sample
        assert_eq!(find_unique_command("s", TOP_LEVEL_COMMANDS).unwrap_err().len(), 3);
    }

    #[test]
    fn test_expand_top_level_and_subcommand() {
        assert_eq!(
            expand_command_abbreviations(args(&["st", "ren", "design", "Concept"])).unwrap(),
            args(&["stages", "rename", "design", "Concept"])
        );
        assert_eq!(
            expand_command_abbreviations(args(&["mo", "JW-1", "casting"])).unwrap(),
            args(&["move", "JW-1", "casting"])
        );
    }

    #[test]
    fn test_expand_skips_global_flags() {
        assert_eq!(
            expand_command_abbreviations(args(&["--orders", "o.json", "met"])).unwrap(),
            args(&["--orders", "o.json", "metrics"])
        );
    }

    #[test]
    fn test_ambiguous_command() {
        let err = expand_command_abbreviations(args(&["s"])).unwrap_err();
        assert!(err.contains("Ambiguous command 's'"));
        let err = expand_command_abbreviations(args(&["stages", "re"])).unwrap_err();
        assert!(err.contains("rename"));
        assert!(err.contains("reorder"));
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(
            expand_command_abbreviations(args(&["frobnicate"])).unwrap(),
            args(&["frobnicate"])
        );
    }
}
