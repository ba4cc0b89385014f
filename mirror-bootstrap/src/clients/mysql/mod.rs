//! sqlx-backed MySQL implementations of the client seams, plus the subprocess
//! plumbing for the dump/restore tools.

use std::process::Output;

mod replica;
mod source;

pub use replica::*;
pub use source::*;

/// Environment variable the MySQL command-line tools read the password from.
///
/// Passing the password through the environment keeps it off the process
/// argument list, which is world-readable on most systems.
const MYSQL_PWD_ENV: &str = "MYSQL_PWD";

/// Quotes a string literal for interpolation into a statement that cannot be
/// prepared (`CHANGE REPLICATION SOURCE TO` does not accept placeholders).
pub(crate) fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');

    quoted
}

/// Quotes an identifier (schema name) with backticks.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Renders a one-line failure description for a finished tool invocation,
/// including whatever the tool printed on stderr.
pub(crate) fn describe_tool_failure(tool: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("{tool} exited with {}", output.status)
    } else {
        format!("{tool} exited with {}: {stderr}", output.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal_escapes_quotes_and_backslashes() {
        assert_eq!(quote_literal("plain"), "'plain'");
        assert_eq!(quote_literal("o'brien"), "'o''brien'");
        assert_eq!(quote_literal(r"back\slash"), r"'back\\slash'");
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("app"), "`app`");
        assert_eq!(quote_ident("odd`name"), "`odd``name`");
    }
}
