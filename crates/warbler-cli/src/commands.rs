use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use tracing::info;
use warbler_auth::{CredentialManager, HashingConfig};
use warbler_db::{Constraint, Database, DbError, NewMessage, Session, Table};
use warbler_types::User;
use warbler_types::api::UserSummary;

use crate::cli::{Cli, Commands, FollowArgs, LoginArgs, PostArgs, ShowArgs, SignupArgs};

pub fn run(cli: Cli) -> Result<ExitCode> {
    let db = Database::open(&cli.db_path)
        .with_context(|| format!("Failed to open database at {}", cli.db_path.display()))?;
    let hashing = HashingConfig::from(&cli.hashing);

    match cli.command {
        Commands::Init => {
            info!("Database ready");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Signup(args) => signup(&db, hashing, args),
        Commands::Login(args) => login(&db, hashing, args),
        Commands::Follow(args) => follow(&db, args),
        Commands::Unfollow(args) => unfollow(&db, args),
        Commands::Post(args) => post(&db, args),
        Commands::Show(args) => show(&db, args),
        Commands::Reset => reset(&db),
    }
}

fn signup(db: &Database, hashing: HashingConfig, args: SignupArgs) -> Result<ExitCode> {
    let manager = CredentialManager::new(hashing)?;

    let result = db.transaction(|session| -> Result<User> {
        manager.signup(
            session,
            Some(args.email.as_str()),
            Some(args.username.as_str()),
            &args.password,
            args.image_url.as_deref(),
        )?;
        lookup(session, &args.username)
    });

    match result {
        Ok(user) => {
            info!(id = user.id, username = %user.username, "User created");
            print_json(&user)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if violated(&err, Constraint::Unique) => {
            eprintln!("username or email already taken");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

fn login(db: &Database, hashing: HashingConfig, args: LoginArgs) -> Result<ExitCode> {
    let manager = CredentialManager::new(hashing)?;
    let mut session = db.session()?;

    match manager.authenticate(&mut session, &args.username, &args.password)? {
        Some(user) => {
            print_json(&user)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("invalid credentials");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn follow(db: &Database, args: FollowArgs) -> Result<ExitCode> {
    let result = db.transaction(|session| -> Result<()> {
        let follower = lookup(session, &args.follower)?;
        let followed = lookup(session, &args.followed)?;
        session.follow(followed.id, follower.id)?;
        Ok(())
    });

    match result {
        Ok(()) => {
            info!(follower = %args.follower, followed = %args.followed, "Follow added");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if violated(&err, Constraint::PrimaryKey) => {
            eprintln!("{} already follows {}", args.follower, args.followed);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

fn unfollow(db: &Database, args: FollowArgs) -> Result<ExitCode> {
    db.transaction(|session| -> Result<()> {
        let follower = lookup(session, &args.follower)?;
        let followed = lookup(session, &args.followed)?;
        session.unfollow(followed.id, follower.id)?;
        Ok(())
    })?;

    info!(follower = %args.follower, followed = %args.followed, "Follow removed");
    Ok(ExitCode::SUCCESS)
}

fn post(db: &Database, args: PostArgs) -> Result<ExitCode> {
    let result = db.transaction(|session| -> Result<()> {
        let user = lookup(session, &args.username)?;
        session.add_message(NewMessage::new(user.id, args.text.as_str()))?;
        Ok(())
    });

    match result {
        Ok(()) => {
            info!(username = %args.username, "Message posted");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if violated(&err, Constraint::Check) => {
            eprintln!(
                "message is longer than {} characters",
                warbler_types::models::MAX_MESSAGE_LEN
            );
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

fn show(db: &Database, args: ShowArgs) -> Result<ExitCode> {
    let mut session = db.session()?;
    let user = lookup(&mut session, &args.username)?;

    let messages = session.messages_for(user.id)?;
    let summary = UserSummary {
        message_count: messages.len(),
        follower_count: session.followers_of(user.id)?.len(),
        following_count: session.following_of(user.id)?.len(),
        latest_message: messages.into_iter().last(),
        user,
    };

    print_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

fn reset(db: &Database) -> Result<ExitCode> {
    db.transaction(|session| -> std::result::Result<(), DbError> {
        session.delete_all(Table::Follows)?;
        session.delete_all(Table::Messages)?;
        session.delete_all(Table::Users)
    })?;

    info!("All users, messages and follows deleted");
    Ok(ExitCode::SUCCESS)
}

fn lookup(session: &mut Session<'_>, username: &str) -> Result<User> {
    session
        .user_by_username(username)?
        .ok_or_else(|| anyhow!("no such user: {username}"))
}

fn violated(err: &anyhow::Error, constraint: Constraint) -> bool {
    err.downcast_ref::<DbError>()
        .and_then(DbError::constraint)
        .is_some_and(|c| c == constraint)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
