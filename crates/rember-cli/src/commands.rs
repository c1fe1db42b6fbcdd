//! CLI commands

use clap::{Args, Parser, Subcommand};
use rember::{
    BlobStore, Entry, MemoryBlobStore, Rember, RemberConfig, RemberError, S3BlobStore,
    SqliteCodeStore, SqliteDocumentStore,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Rember(#[from] RemberError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<rember::StoreError> for CliError {
    fn from(e: rember::StoreError) -> Self {
        Self::Rember(e.into())
    }
}

#[derive(Debug, Parser)]
#[command(name = "rember", version, about = "Code-protected folders and JPEG galleries")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new folder, logging in instead if the code is taken
    Register(Credentials),
    /// Check a code's password
    Login(Credentials),
    /// Show the code registered on this device
    Status,
    /// Manage the sub-folders of a code
    #[command(subcommand)]
    Subfolders(SubfolderCommand),
    /// Upload an image into a sub-folder
    Upload {
        #[command(flatten)]
        credentials: Credentials,
        /// Target sub-folder
        #[arg(long)]
        subfolder: String,
        /// Image file in any format the encoder can read
        file: PathBuf,
    },
    /// Print the addresses of every image in a sub-folder
    Images {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        subfolder: String,
    },
}

#[derive(Debug, Subcommand)]
enum SubfolderCommand {
    /// List sub-folders with their indices
    List(Credentials),
    /// Append a sub-folder
    Add {
        #[command(flatten)]
        credentials: Credentials,
        name: String,
    },
    /// Remove sub-folders by index
    Remove {
        #[command(flatten)]
        credentials: Credentials,
        #[arg(required = true)]
        indices: Vec<usize>,
    },
}

#[derive(Debug, Args)]
struct Credentials {
    /// Folder code
    #[arg(long)]
    code: String,
    #[arg(long)]
    password: String,
}

impl Cli {
    pub async fn execute(self) -> Result<(), CliError> {
        let config = RemberConfig::from_env()?;
        let needs_blobs = self.command.needs_blob_store(&config);
        let client = connect(config, needs_blobs).await?;

        match self.command {
            Command::Register(credentials) => {
                match client
                    .register_or_login(&credentials.code, &credentials.password)
                    .await?
                {
                    Entry::Registered(code) => println!("Created folder {} ({})", code.name, code.id),
                    Entry::LoggedIn => println!("Folder {} already exists, logged in", credentials.code),
                }
            }
            Command::Login(credentials) => {
                client.login(&credentials.code, &credentials.password).await?;
                println!("Logged in to {}", credentials.code);
            }
            Command::Status => match client.local_code().await? {
                Some(code) => println!("{} ({})", code.name, code.id),
                None => println!("No folder registered on this device"),
            },
            Command::Subfolders(command) => subfolders(&client, command).await?,
            Command::Upload {
                credentials,
                subfolder,
                file,
            } => {
                login(&client, &credentials).await?;
                let image = tokio::fs::read(&file).await.map_err(|source| CliError::Read {
                    path: file.clone(),
                    source,
                })?;
                let address = client.upload(&credentials.code, &subfolder, &image).await?;
                println!("{}", address);
            }
            Command::Images {
                credentials,
                subfolder,
            } => {
                login(&client, &credentials).await?;
                for address in client.list_images(&credentials.code, &subfolder).await? {
                    println!("{}", address);
                }
            }
        }

        Ok(())
    }
}

impl Command {
    /// Whether the command reads or writes blobs
    fn needs_blob_store(&self, config: &RemberConfig) -> bool {
        match self {
            Command::Upload { .. } | Command::Images { .. } => true,
            Command::Subfolders(SubfolderCommand::Add { .. }) => config.materialize_prefixes,
            _ => false,
        }
    }
}

async fn subfolders(client: &Rember, command: SubfolderCommand) -> Result<(), CliError> {
    match command {
        SubfolderCommand::List(credentials) => {
            login(client, &credentials).await?;
            for (index, name) in client
                .list_subfolders(&credentials.code)
                .await?
                .iter()
                .enumerate()
            {
                println!("{:>3}  {}", index, name);
            }
        }
        SubfolderCommand::Add { credentials, name } => {
            login(client, &credentials).await?;
            client.add_subfolder(&credentials.code, &name).await?;
            println!("Added {}", name);
        }
        SubfolderCommand::Remove {
            credentials,
            indices,
        } => {
            login(client, &credentials).await?;
            let indices: BTreeSet<usize> = indices.into_iter().collect();
            client.remove_subfolders(&credentials.code, &indices).await?;
            println!("Removed {} sub-folder(s)", indices.len());
        }
    }
    Ok(())
}

async fn login(client: &Rember, credentials: &Credentials) -> Result<(), CliError> {
    client
        .login(&credentials.code, &credentials.password)
        .await?;
    Ok(())
}

/// Build a client over the backends configured in the environment
///
/// S3 is only configured when `needs_blobs` is set; other commands get an
/// in-memory blob store they never touch.
async fn connect(config: RemberConfig, needs_blobs: bool) -> Result<Rember, CliError> {
    debug!(?config, needs_blobs, "loaded configuration");

    let documents = SqliteDocumentStore::from_env(config.collection.clone()).await?;
    let local = SqliteCodeStore::with_pool(documents.pool().clone()).await?;

    let blobs: Arc<dyn BlobStore> = if needs_blobs {
        let s3 = S3BlobStore::from_env()?;
        if let Err(e) = s3.ensure_bucket().await {
            error!("Failed to ensure S3 bucket exists: {}", e);
        }
        Arc::new(s3)
    } else {
        Arc::new(MemoryBlobStore::new())
    };

    Ok(Rember::new(
        Arc::new(documents),
        blobs,
        Arc::new(local),
        config,
    )?)
}
