use clap::{Arg, ArgMatches, Command};
use itertools::Itertools;
use std::error::Error;
use std::process;

use session_vault::auth::{validate_login, validate_registration, AuthResponse};
use session_vault::utils::io::{prompt, prompt_with_confirmation, read_password};
use session_vault::utils::logging::initialize_logging;
use session_vault::utils::time::{format_timestamp, time_since};
use session_vault::{AppConfig, AuthService, FileStorage, User};

type Auth = AuthService<FileStorage>;

fn cli() -> Command {
    Command::new("session-vault")
        .about("Local credential store with a persistent login session")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .value_name("DIR")
                .help("Directory holding the user store"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .value_name("LEVEL")
                .help("Log level (error, warn, info, debug, trace)"),
        )
        .subcommand(
            Command::new("register")
                .about("Create a new account and log in")
                .arg(Arg::new("username").help("Name for the new account"))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .value_name("PASSWORD")
                        .help("Password (prompted for when omitted)"),
                ),
        )
        .subcommand(
            Command::new("login")
                .about("Log in to an existing account")
                .arg(Arg::new("username").help("Account name"))
                .arg(
                    Arg::new("password")
                        .long("password")
                        .value_name("PASSWORD")
                        .help("Password (prompted for when omitted)"),
                ),
        )
        .subcommand(Command::new("logout").about("End the current session"))
        .subcommand(Command::new("whoami").about("Show the logged in user"))
        .subcommand(
            Command::new("users").about("List registered accounts").arg(
                Arg::new("sort")
                    .long("sort")
                    .value_name("SORT")
                    .value_parser(["name", "created", "login"])
                    .help("Sort by name, creation time or last login"),
            ),
        )
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = cli().get_matches();

    let config = AppConfig::from_env().with_overrides(
        matches.get_one::<String>("data-dir").map(String::as_str),
        matches.get_one::<String>("log-level").map(String::as_str),
    );

    if let Err(e) = initialize_logging(&config.log_path(), config.log_level) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let auth = AuthService::new(FileStorage::new(&config.data_dir));

    match matches.subcommand() {
        Some(("register", sub)) => handle_register(&auth, sub),
        Some(("login", sub)) => handle_login(&auth, sub),
        Some(("logout", _)) => handle_logout(&auth),
        Some(("whoami", _)) => {
            match auth.current_user_value() {
                Some(user) => print_user(&user),
                None => println!("Not logged in."),
            }
            Ok(())
        }
        Some(("users", sub)) => {
            list_users(auth.users(), sub.get_one::<String>("sort").map(String::as_str));
            Ok(())
        }
        _ => unreachable!("subcommand_required guarantees a subcommand"),
    }
}

fn handle_register(auth: &Auth, sub: &ArgMatches) -> Result<(), Box<dyn Error>> {
    if let Some(current) = auth.current_user_value() {
        let question = format!("Currently logged in as {}. Register a new account anyway?", current.username);
        if !prompt_with_confirmation(&question)? {
            println!("Registration cancelled.");
            return Ok(());
        }
    }

    let username = username_arg(sub)?;
    let (password, confirm) = match sub.get_one::<String>("password") {
        Some(password) => (password.clone(), password.clone()),
        None => (
            read_password("Password: ")?,
            read_password("Confirm password: ")?,
        ),
    };

    validate_registration(&username, &password, &confirm)?;
    report(auth.register(&username, &password)?)
}

fn handle_login(auth: &Auth, sub: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let username = username_arg(sub)?;
    let password = match sub.get_one::<String>("password") {
        Some(password) => password.clone(),
        None => read_password("Password: ")?,
    };

    validate_login(&username, &password)?;
    report(auth.login(&username, &password)?)
}

fn handle_logout(auth: &Auth) -> Result<(), Box<dyn Error>> {
    let was = auth.current_user_value();
    auth.logout()?;
    match was {
        Some(user) => println!("Logged out {}.", user.username),
        None => println!("Not logged in."),
    }
    Ok(())
}

fn username_arg(sub: &ArgMatches) -> Result<String, Box<dyn Error>> {
    match sub.get_one::<String>("username") {
        Some(username) => Ok(username.clone()),
        None => Ok(prompt("Username: ")?),
    }
}

fn report(response: AuthResponse) -> Result<(), Box<dyn Error>> {
    if !response.success {
        return Err(response.message.into());
    }
    println!("{}", response.message);
    if let Some(user) = &response.user {
        print_user(user);
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("User: {}", user.username);
    println!("Id: {}", user.id);
    println!("Created: {}", format_timestamp(&user.created_at));
    println!(
        "Last login: {} ({})",
        format_timestamp(&user.last_login_time),
        time_since(&user.last_login_time)
    );
}

fn list_users(users: Vec<User>, sort: Option<&str>) {
    if users.is_empty() {
        println!("No registered users.");
        return;
    }

    let sorted = users
        .iter()
        .sorted_by(|a, b| match sort {
            Some("created") => a.created_at.cmp(&b.created_at),
            Some("login") => b.last_login_time.cmp(&a.last_login_time),
            _ => a.username.cmp(&b.username),
        })
        .collect::<Vec<_>>();

    for user in sorted {
        println!(
            "{:<20} created {}  last login {}",
            user.username,
            format_timestamp(&user.created_at),
            time_since(&user.last_login_time)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        cli().debug_assert();
    }

    #[test]
    fn test_parses_global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["session-vault", "login", "alice", "--data-dir", "/tmp/v"])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("data-dir").map(String::as_str),
            Some("/tmp/v")
        );
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "login");
        assert_eq!(
            sub.get_one::<String>("username").map(String::as_str),
            Some("alice")
        );
    }

    #[test]
    fn test_rejects_unknown_sort() {
        let result = cli().try_get_matches_from(["session-vault", "users", "--sort", "age"]);
        assert!(result.is_err());
    }
}
