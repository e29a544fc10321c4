use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use sqlx::PgPool;

use schoolboard_cli::admin::create_admin;
use schoolboard_cli::seeder::{self, SeedConfig, UsersByRole};

#[derive(Parser)]
#[command(name = "schoolboard-cli")]
#[command(about = "SchoolBoard CLI - Administrative tools for SchoolBoard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an active administrator account
    CreateAdmin {
        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed fake users and communications
    Seed {
        /// Number of office members
        #[arg(long, default_value = "2")]
        office_members: usize,

        /// Number of teachers
        #[arg(long, default_value = "10")]
        teachers: usize,

        /// Number of parents
        #[arg(long, default_value = "40")]
        parents: usize,

        /// Number of communications
        #[arg(short = 'c', long, default_value = "50")]
        communications: usize,
    },
    /// Seed only users
    SeedUsers {
        #[arg(long, default_value = "2")]
        office_members: usize,

        #[arg(long, default_value = "10")]
        teachers: usize,

        #[arg(long, default_value = "40")]
        parents: usize,
    },
    /// Seed only communications
    SeedCommunications {
        /// Number of communications to create
        #[arg(short = 'c', long, default_value = "50")]
        count: usize,
    },
    /// Clear all seeded data (keeps admins and real records)
    ClearSeed,
    /// Clear only seeded communications
    ClearCommunications,
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {context}: {err}");
    std::process::exit(1);
}

fn prompt_text(prompt: &str) -> String {
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .unwrap_or_else(|e| fail(&format!("Failed to read {}", prompt.to_lowercase()), e))
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| fail("Configuration error", "DATABASE_URL must be set"));

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .unwrap_or_else(|e| fail("Failed to connect to database", e));

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Seed {
            office_members,
            teachers,
            parents,
            communications,
        } => {
            let config = SeedConfig::default()
                .with_users(UsersByRole {
                    office_members,
                    teachers,
                    parents,
                })
                .with_communications(communications);
            if let Err(e) = seeder::seed_all(&pool, config).await {
                fail("Error seeding database", e);
            }
        }
        Commands::SeedUsers {
            office_members,
            teachers,
            parents,
        } => {
            let counts = UsersByRole {
                office_members,
                teachers,
                parents,
            };
            match seeder::users::seed_users(&pool, &counts, seeder::SEED_PASSWORD).await {
                Ok(count) => println!("✅ Created {} users", count),
                Err(e) => fail("Error seeding users", e),
            }
        }
        Commands::SeedCommunications { count } => {
            match seeder::communications::seed_communications(&pool, count).await {
                Ok(count) => println!("✅ Created {} communications", count),
                Err(e) => fail("Error seeding communications", e),
            }
        }
        Commands::ClearSeed => {
            if let Err(e) = seeder::clear_all(&pool).await {
                fail("Error clearing seeded data", e);
            }
        }
        Commands::ClearCommunications => {
            match seeder::communications::clear_communications(&pool).await {
                Ok(count) => println!("✅ Deleted {} communications", count),
                Err(e) => fail("Error clearing communications", e),
            }
        }
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) {
    let first_name = first_name.unwrap_or_else(|| prompt_text("First name"));
    let last_name = last_name.unwrap_or_else(|| prompt_text("Last name"));
    let email = email.unwrap_or_else(|| prompt_text("Email address"));

    let password = password.unwrap_or_else(|| {
        Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .unwrap_or_else(|e| fail("Failed to read password", e))
    });

    match create_admin(pool, &first_name, &last_name, &email, &password).await {
        Ok(_) => {
            println!("\n✅ Admin created successfully!");
            println!("   Email: {}", email.trim().to_lowercase());
            println!("   Name: {} {}", first_name, last_name);
        }
        Err(e) => fail("Error creating admin", e),
    }
}
