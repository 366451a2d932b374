//! GamepadTest CLI - admin sign-in and blog management.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and print an access token
//! gt-cli auth login -e admin@gamepadtest.com
//!
//! # List drafts and published posts
//! gt-cli blog list --all
//!
//! # Publish a new post
//! gt-cli blog create --title "Stick Drift Explained" --content "..." --publish
//! ```
//!
//! # Commands
//!
//! - `auth login|signup|watch` - Drive the admin auth context
//! - `blog list|show|create|update|delete` - Call the site's blog API
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - Hosted project (auth commands)
//! - `GT_API_URL` - Site base URL (default: `http://localhost:3000`)
//! - `GT_ADMIN_EMAIL`, `GT_ADMIN_PASSWORD` - Admin credentials
//! - `GT_ADMIN_TOKEN` - Access token for admin blog commands

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

use gamepadtest_core::{BlogPatch, NewBlog};

mod commands;

use commands::{AdminCredentials, CliError, blog::ApiClient};

#[derive(Parser)]
#[command(name = "gt-cli")]
#[command(author, version, about = "GamepadTest admin CLI")]
struct Cli {
    /// Site base URL
    #[arg(long, env = "GT_API_URL", default_value = "http://localhost:3000", global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Admin sign-in
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage blog posts
    Blog {
        #[command(subcommand)]
        action: BlogAction,
    },
}

#[derive(Args)]
struct CredentialArgs {
    /// Admin email address
    #[arg(short, long, env = "GT_ADMIN_EMAIL")]
    email: Option<String>,

    /// Admin password
    #[arg(long, env = "GT_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl CredentialArgs {
    fn into_credentials(self) -> Option<AdminCredentials> {
        Some(AdminCredentials {
            email: self.email?,
            password: SecretString::from(self.password?),
        })
    }
}

#[derive(Args)]
struct TokenArgs {
    /// Access token from `auth login`
    #[arg(long, env = "GT_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(flatten)]
    credentials: CredentialArgs,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in and print the access token
    Login(CredentialArgs),
    /// Register an account
    Signup(CredentialArgs),
    /// Sign in and log session changes until Ctrl+C
    Watch(CredentialArgs),
}

#[derive(Subcommand)]
enum BlogAction {
    /// List published posts (or every post with --all)
    List {
        /// Include drafts (admin)
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        auth: TokenArgs,
    },
    /// Show one published post
    Show {
        /// Post slug
        slug: String,
    },
    /// Create a post (admin)
    Create {
        #[arg(long)]
        title: String,

        /// Markdown body
        #[arg(long, default_value = "")]
        content: String,

        #[arg(long)]
        excerpt: Option<String>,

        /// Image URL
        #[arg(long)]
        featured_image: Option<String>,

        /// Publish immediately
        #[arg(long)]
        publish: bool,

        #[command(flatten)]
        auth: TokenArgs,
    },
    /// Update supplied fields of a post (admin)
    Update {
        /// Post id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        excerpt: Option<String>,

        /// Image URL
        #[arg(long, conflicts_with = "clear_image")]
        featured_image: Option<String>,

        /// Remove the featured image
        #[arg(long)]
        clear_image: bool,

        #[arg(long, conflicts_with = "unpublish")]
        publish: bool,

        #[arg(long)]
        unpublish: bool,

        #[command(flatten)]
        auth: TokenArgs,
    },
    /// Delete a post (admin)
    Delete {
        /// Post id
        id: String,

        #[command(flatten)]
        auth: TokenArgs,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn required(credentials: CredentialArgs) -> Result<AdminCredentials, CliError> {
    credentials
        .into_credentials()
        .ok_or(CliError::MissingCredentials)
}

async fn admin_client(api_url: &str, auth: TokenArgs) -> Result<ApiClient, CliError> {
    let token =
        commands::blog::admin_token(auth.token, auth.credentials.into_credentials()).await?;
    ApiClient::new(api_url, Some(token))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let api_url = cli.api_url;

    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login(credentials) => commands::auth::login(&required(credentials)?).await,
            AuthAction::Signup(credentials) => {
                commands::auth::signup(&required(credentials)?).await
            }
            AuthAction::Watch(credentials) => commands::auth::watch(&required(credentials)?).await,
        },
        Commands::Blog { action } => match action {
            BlogAction::List { all, auth } => {
                let client = if all {
                    admin_client(&api_url, auth).await?
                } else {
                    ApiClient::new(&api_url, None)?
                };
                commands::blog::list(&client, all).await
            }
            BlogAction::Show { slug } => {
                commands::blog::show(&ApiClient::new(&api_url, None)?, &slug).await
            }
            BlogAction::Create {
                title,
                content,
                excerpt,
                featured_image,
                publish,
                auth,
            } => {
                let blog = NewBlog {
                    title: Some(title),
                    content: Some(content),
                    excerpt,
                    featured_image,
                    published: Some(publish),
                };
                commands::blog::create(&admin_client(&api_url, auth).await?, blog).await
            }
            BlogAction::Update {
                id,
                title,
                content,
                excerpt,
                featured_image,
                clear_image,
                publish,
                unpublish,
                auth,
            } => {
                let patch = BlogPatch {
                    title,
                    content,
                    excerpt,
                    featured_image: if clear_image {
                        Some(None)
                    } else {
                        featured_image.map(Some)
                    },
                    published: match (publish, unpublish) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    },
                };
                commands::blog::update(&admin_client(&api_url, auth).await?, &id, patch).await
            }
            BlogAction::Delete { id, auth } => {
                commands::blog::delete(&admin_client(&api_url, auth).await?, &id).await
            }
        },
    }
}
