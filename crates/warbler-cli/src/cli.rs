//! Command-line definitions for the `warbler` admin binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warbler_auth::HashingConfig;

/// Warbler user store administration
#[derive(Parser, Debug)]
#[command(name = "warbler")]
#[command(about = "Warbler: manage users, messages and follows in a Warbler database")]
#[command(version)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long = "db", default_value = "warbler.db", env = "WARBLER_DB_PATH", global = true)]
    pub db_path: PathBuf,

    #[command(flatten)]
    pub hashing: HashingArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Argon2id work factor used for new passwords
#[derive(clap::Args, Debug)]
pub struct HashingArgs {
    /// Memory cost in KiB
    #[arg(long, default_value_t = HashingConfig::default().memory_kib, env = "WARBLER_HASH_MEMORY_KIB", global = true)]
    pub hash_memory_kib: u32,

    /// Number of passes
    #[arg(long, default_value_t = HashingConfig::default().iterations, env = "WARBLER_HASH_ITERATIONS", global = true)]
    pub hash_iterations: u32,

    /// Degree of parallelism
    #[arg(long, default_value_t = HashingConfig::default().parallelism, env = "WARBLER_HASH_PARALLELISM", global = true)]
    pub hash_parallelism: u32,
}

impl From<&HashingArgs> for HashingConfig {
    fn from(args: &HashingArgs) -> Self {
        HashingConfig {
            memory_kib: args.hash_memory_kib,
            iterations: args.hash_iterations,
            parallelism: args.hash_parallelism,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or migrate the database
    Init,
    /// Register a new user with a hashed password
    Signup(SignupArgs),
    /// Check a username/password pair
    Login(LoginArgs),
    /// Make one user follow another
    Follow(FollowArgs),
    /// Remove a follow edge
    Unfollow(FollowArgs),
    /// Post a message as a user
    Post(PostArgs),
    /// Show a user and their relationship counts
    Show(ShowArgs),
    /// Delete every user, message and follow
    Reset,
}

#[derive(clap::Args, Debug)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
    /// Avatar URL; the placeholder image is used when omitted
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
}

#[derive(clap::Args, Debug)]
pub struct FollowArgs {
    /// Username of the user doing the following
    #[arg(long)]
    pub follower: String,
    /// Username of the user being followed
    #[arg(long)]
    pub followed: String,
}

#[derive(clap::Args, Debug)]
pub struct PostArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub text: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    #[arg(long)]
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_signup() {
        let cli = Cli::try_parse_from([
            "warbler",
            "--db",
            "/tmp/w.db",
            "signup",
            "--email",
            "test@test.com",
            "--username",
            "testuser",
            "--password",
            "pw",
        ])
        .unwrap();

        assert_eq!(cli.db_path, PathBuf::from("/tmp/w.db"));
        match cli.command {
            Commands::Signup(args) => {
                assert_eq!(args.username, "testuser");
                assert!(args.image_url.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn hashing_args_map_to_config() {
        let cli = Cli::try_parse_from([
            "warbler",
            "--hash-memory-kib",
            "64",
            "--hash-iterations",
            "3",
            "init",
        ])
        .unwrap();

        let config = HashingConfig::from(&cli.hashing);
        assert_eq!(config.memory_kib, 64);
        assert_eq!(config.iterations, 3);
    }
}
