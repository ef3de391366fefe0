use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use inkwell::cli::create_admin;
use inkwell::inkwell_config::PasswordConfig;
use inkwell::inkwell_db::{Storage, init_db_pool};

#[derive(Parser)]
#[command(name = "inkwell-cli")]
#[command(about = "Inkwell CLI - Administrative tools for Inkwell", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account
    CreateAdmin {
        /// Username of the administrator
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = init_db_pool(&database_url).await?;
    let storage = Storage::postgres(pool);

    match cli.command {
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => handle_create_admin(&storage, username, email, password).await,
    }
}

async fn handle_create_admin(
    storage: &Storage,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    // Use provided values or prompt interactively
    let username = match username {
        Some(username) => username,
        None => Input::new().with_prompt("Username").interact_text()?,
    };

    let email = match email {
        Some(email) => email,
        None => Input::new().with_prompt("Email address").interact_text()?,
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let hash_cost = PasswordConfig::from_env().hash_cost;
    match create_admin(storage, &username, &email, &password, hash_cost).await {
        Ok(user) => {
            println!("\n✅ Administrator created successfully!");
            println!("   Username: {}", user.username);
            println!("   Email: {}", user.email);
            Ok(())
        }
        Err(e) => {
            let translation = e.translate();
            eprintln!("\n❌ Error creating administrator: {}", translation.message);
            if let Some(details) = translation.details {
                eprintln!("   {}", serde_json::to_string(&details)?);
            }
            std::process::exit(1);
        }
    }
}
