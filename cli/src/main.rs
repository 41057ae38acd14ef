use chrono::Duration;
use clap::{Parser, Subcommand};
use coursemart::Config;
use coursemart::auth::{CryptError, UserClaims, generate_token};
use coursemart::model::entity::{Category, CategoryCreate, Course, UserEntity, UserEntityCreate};
use coursemart::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use coursemart::web::AuthenticatedUser;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for operating the course marketplace DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommands,
    },

    /// Issue development session tokens
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = false)]
        teacher: bool,
        /// Id known to the identity provider, generated when omitted
        #[arg(long)]
        id: Option<Uuid>,
    },
}

/// Category management
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    Add {
        #[arg(long)]
        name: String,
    },
}

/// Token management
#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Prints a `SID` cookie value for the user with this email
    Issue {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = 1)]
        days: i64,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Publish {
        #[arg(long)]
        id: Uuid,
    },
    Unpublish {
        #[arg(long)]
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> coursemart::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    let config = Config::get_or_init(cfg!(debug_assertions)).await;

    let database_uri =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| config.app().database_uri().to_string());
    let db_con = DbConnection::connect(&database_uri)?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { email, teacher, id } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreate {
                        id,
                        email,
                        is_teacher: teacher,
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Category { action } => match action {
            CategoryCommands::Add { name } => {
                let category = Category::create(&mm, &actor, CategoryCreate { name }).await?;
                println!("Category created: {:?}", category);
            }
        },

        Commands::Token { action } => match action {
            TokenCommands::Issue { email, days } => {
                let user = UserEntity::find_by_email(&mm, &actor, &email)
                    .await?
                    .ok_or(DatabaseError::NotFound)?;

                let claims = UserClaims::new(user.id(), Duration::days(days));
                let token =
                    generate_token(claims, config.app().jwt()).map_err(CryptError::from)?;
                println!("{token}");
            }
        },

        Commands::Course { action } => {
            let (id, is_published) = match action {
                CourseCommands::Publish { id } => (id, true),
                CourseCommands::Unpublish { id } => (id, false),
            };

            let course = Course::get(&mm, &actor, id)
                .await?
                .set_published(&mm, &actor, is_published)
                .await?;
            println!("Course {} published: {}", course.id(), course.is_published());
        }
    }

    Ok(())
}
