use std::io::{self, Write};

/// Helper function to read a trimmed line from stdin
pub fn read_line() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Print `label` and read the answer from stdin
pub fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    read_line()
}

/// Read a password without echo, after printing `label`
pub fn read_password(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    rpassword::read_password()
}

/// Helper function to prompt for a yes/no answer, defaulting to yes
pub fn prompt_with_confirmation(question: &str) -> io::Result<bool> {
    let response = prompt(&format!("{} (y/n): ", question))?.to_lowercase();
    Ok(is_affirmative(&response))
}

fn is_affirmative(response: &str) -> bool {
    response.is_empty() || response == "y" || response == "yes"
}
