//! POSIX shell quoting for commands sent over ssh.
//!
//! ssh joins its trailing arguments with spaces and hands the result to the
//! remote login shell, so every argument must be quoted individually.

/// Quote `arg` for a POSIX shell. Arguments made only of safe characters are
/// returned unchanged.
#[must_use]
pub fn quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"@%+=:,./_-".contains(&b));
    if safe {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Quote and join `args` into one remote command line.
#[must_use]
pub fn join(args: &[&str]) -> String {
    args.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" ")
}
