//! Out-of-band administration. Role changes never go through the HTTP API,
//! so promoting the first administrator happens here.

use std::error::Error;

use clap::{Args, Parser, Subcommand};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use service::{auth::roles, users};

#[derive(Parser, Debug)]
#[command(name = "spesa_admin")]
#[command(about = "Admin utilities for Spesa (list users, manage roles)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./spesa.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// List all accounts with their roles.
    List,
    /// Grant the ADMIN role to an account.
    Promote(RoleArgs),
    /// Remove the ADMIN role from an account.
    Demote(RoleArgs),
}

#[derive(Args, Debug)]
struct RoleArgs {
    #[arg(long)]
    email: String,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for user in users::get_all(&db).await? {
                println!("{}\t{}\t{}\t{}", user.id, user.name, user.email, user.roles);
            }
        }
        Command::User(User {
            command: UserCommand::Promote(args),
        }) => {
            let user = users::get_by_email(&db, &args.email).await?;
            let mut user_roles = users::parse_roles(&user)?;
            if user_roles.iter().any(|role| role == roles::ADMIN) {
                eprintln!("already an admin: {}", args.email);
                std::process::exit(1);
            }

            user_roles.push(roles::ADMIN.to_string());
            users::assign_roles(&db, user.id, &user_roles).await?;
            println!("promoted: {}", args.email);
        }
        Command::User(User {
            command: UserCommand::Demote(args),
        }) => {
            let user = users::get_by_email(&db, &args.email).await?;
            let mut user_roles = users::parse_roles(&user)?;
            let before = user_roles.len();
            user_roles.retain(|role| role != roles::ADMIN);
            if user_roles.len() == before {
                eprintln!("not an admin: {}", args.email);
                std::process::exit(1);
            }

            users::assign_roles(&db, user.id, &user_roles).await?;
            println!("demoted: {}", args.email);
        }
    }

    Ok(())
}
