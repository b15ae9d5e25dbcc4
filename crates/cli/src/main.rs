use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use folio_client::{HttpPortfolioApi, LoginRequest};
use folio_core::config::{api_origin_from_env_value, request_timeout_from_env_value};
use folio_core::constants::DEFAULT_MAX_FIELD_DEPTH;
use folio_core::{
    synthesize_template, validate_required, CoreConfig, FieldRenderer, FileSessionStore,
    ImagePathResolver, PortfolioApi, SessionHandle, UploadFile,
};
use folio_types::LanguageMode;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION_FILE: &str = ".folio/session.json";

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio section editor CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the editable controls for a JSON document
    Inspect {
        /// JSON file holding a single object
        file: PathBuf,
    },
    /// Print the template a new item of a section would start from
    Template {
        /// Section name (e.g. skills, projects, services)
        section: String,
        /// JSON file with the section's existing items
        #[arg(long)]
        items: Option<PathBuf>,
    },
    /// Resolve a stored image reference to a URL
    Resolve {
        /// Stored path or URL
        path: String,
    },
    /// Check a JSON document for missing required fields
    Validate {
        /// JSON file holding a single object
        file: PathBuf,
        /// Required keys (comma-separated)
        #[arg(long, value_delimiter = ',')]
        required: Vec<String>,
    },
    /// Sign in and store the session
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// List sections and their required fields
    Sections,
    /// Upload one or more images
    Upload {
        /// Image files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Publish the portfolio
    Publish,
    /// Unpublish the portfolio
    Unpublish,
    /// Set the public language mode
    Language {
        /// ar, en or both
        mode: LanguageMode,
    },
}

/// Settings read from the environment once at startup.
struct Settings {
    core: CoreConfig,
    session_file: PathBuf,
}

impl Settings {
    fn from_env() -> anyhow::Result<Self> {
        let origin = api_origin_from_env_value(std::env::var("FOLIO_API_ORIGIN").ok());
        let timeout = request_timeout_from_env_value(std::env::var("FOLIO_REQUEST_TIMEOUT_SECS").ok())?;
        let session_file = std::env::var("FOLIO_SESSION_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));

        Ok(Self {
            core: CoreConfig::new(origin, timeout, DEFAULT_MAX_FIELD_DEPTH)?,
            session_file,
        })
    }

    fn session(&self) -> SessionHandle {
        SessionHandle::new(Arc::new(FileSessionStore::new(&self.session_file)))
    }

    fn api(&self) -> anyhow::Result<HttpPortfolioApi> {
        Ok(HttpPortfolioApi::new(&self.core, self.session())?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Some(Commands::Inspect { file }) => {
            println!("{}", inspect(&settings.core, &read_object(&file)?)?);
        }
        Some(Commands::Template { section, items }) => {
            let items = match items {
                Some(path) => read_items(&path)?,
                None => Vec::new(),
            };
            let template = synthesize_template(&section, &items);
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        Some(Commands::Resolve { path }) => {
            let resolver = ImagePathResolver::new(settings.core.api_origin());
            println!("{}", resolver.resolve(&path));
        }
        Some(Commands::Validate { file, required }) => {
            let form = read_object(&file)?;
            validate_required(&form, &required)?;
            println!("All required fields are present.");
        }
        Some(Commands::Login { email, password }) => {
            let auth = settings
                .api()?
                .auth()
                .login(&LoginRequest { email, password })
                .await?;
            if auth.token.is_none() {
                bail!("The server did not return a token.");
            }
            let name = auth
                .user
                .and_then(|u| u.name.or(u.email))
                .unwrap_or_else(|| "unknown user".into());
            println!("Signed in as {name}.");
        }
        Some(Commands::Logout) => {
            settings.session().logout()?;
            println!("Signed out.");
        }
        Some(Commands::Sections) => {
            let sections = settings.api()?.all_sections().await?;
            for line in section_lines(&sections) {
                println!("{line}");
            }
        }
        Some(Commands::Upload { files }) => {
            let api = settings.api()?;
            let files = files
                .iter()
                .map(|path| read_upload(path))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let paths = if files.len() == 1 {
                let file = files.into_iter().next().context("no file to upload")?;
                api.upload_image(file).await?.path().into_iter().collect()
            } else {
                api.upload_images(files).await?.paths()
            };
            for path in paths {
                println!("{path}");
            }
        }
        Some(Commands::Publish) => {
            let message = settings.api()?.publish().await?;
            println!("{}", message.message.unwrap_or_else(|| "Portfolio published.".into()));
        }
        Some(Commands::Unpublish) => {
            let message = settings.api()?.unpublish().await?;
            println!("{}", message.message.unwrap_or_else(|| "Portfolio unpublished.".into()));
        }
        Some(Commands::Language { mode }) => {
            settings.api()?.update_language_mode(mode).await?;
            println!("Language mode updated to {mode}.");
        }
        None => {
            println!("Use 'folio --help' for commands");
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn read_object(path: &Path) -> anyhow::Result<Map<String, Value>> {
    match read_json(path)? {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must hold a JSON object", path.display()),
    }
}

/// Accepts a bare array or an `{ "items": [...] }` envelope.
fn read_items(path: &Path) -> anyhow::Result<Vec<Value>> {
    match folio_core::unwrap_envelope(read_json(path)?, "items") {
        Value::Array(items) => Ok(items),
        _ => bail!("{} must hold a JSON array of items", path.display()),
    }
}

fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let Some(media_type) = folio_files::detect_image_media_type(&bytes) else {
        bail!("{} is not a supported image", path.display());
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".into());
    Ok(UploadFile::new(file_name, media_type, bytes))
}

fn inspect(config: &CoreConfig, form: &Map<String, Value>) -> anyhow::Result<String> {
    let renderer = FieldRenderer::new(
        ImagePathResolver::new(config.api_origin()),
        config.max_field_depth(),
    );
    let controls = renderer.render_form(form, &HashSet::new());
    Ok(serde_json::to_string_pretty(&controls)?)
}

fn section_lines(sections: &Value) -> Vec<String> {
    let Some(sections) = sections.as_object() else {
        return Vec::new();
    };
    sections
        .iter()
        .map(|(name, meta)| {
            let required = folio_core::validation::required_keys(Some(meta));
            if required.is_empty() {
                name.clone()
            } else {
                format!("{name} (required: {})", required.join(", "))
            }
        })
        .collect()
}
