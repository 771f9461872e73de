use std::{
    collections::{BTreeMap, BTreeSet},
    env, fmt,
    fs::read_to_string,
    path::{Path, PathBuf},
};

use _model::Source;
use anyhow::{bail, ensure, Context, Result};
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

pub const EXAMPLE_FILE: &str = "config.example.json";
pub const COLES_API_KEY: &str = "COLES_API_KEY";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub packs: Vec<ProductEntry>,
    #[serde(default)]
    pub credentials: Credentials,
    /// When set, every pack must use one of these sizes.
    #[serde(default)]
    pub pack_sizes: Option<BTreeSet<u32>>,
}

/// One tracked product at one retailer.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ProductEntry {
    pub retailer: String,
    #[serde(default)]
    pub suburb: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub pack_size: u32,
    pub source: Source,
    #[serde(deserialize_with = "id")]
    pub product_id: String,
    pub url: String,
    #[serde(default, deserialize_with = "optional_id")]
    pub store_id: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub coles_api_key: Option<String>,
}

// never print secrets
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "coles_api_key",
                &self.coles_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Environment values win over the ones in the config file.
    pub fn with_env(self) -> Self {
        self.overlay(env::var(COLES_API_KEY).ok())
    }

    fn overlay(mut self, coles_api_key: Option<String>) -> Self {
        if let Some(x) = coles_api_key.filter(|x| !x.trim().is_empty()) {
            self.coles_api_key = Some(x);
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|x| x.to_str()) {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Loads and validates the pack list. Any problem here stops the run before
/// a single request goes out.
pub fn load(path: &Path) -> Result<Config> {
    let path = resolve(path)?;
    let raw = read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = parse(&raw, Format::of(&path))
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    Ok(config)
}

fn resolve(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }

    let fallback = path.with_file_name(EXAMPLE_FILE);
    if fallback != path && fallback.exists() {
        warn!(
            "{} missing; falling back to {}",
            path.display(),
            fallback.display()
        );
        return Ok(fallback);
    }

    bail!(
        "No configuration found at {}. Create it based on {EXAMPLE_FILE}",
        path.display()
    )
}

fn parse(raw: &str, format: Format) -> Result<Config> {
    let config: Config = match format {
        Format::Json => serde_json::from_str(raw)?,
        Format::Yaml => serde_yaml::from_str(raw)?,
    };
    config.validate()?;
    Ok(config)
}

impl Config {
    fn validate(&self) -> Result<()> {
        ensure!(!self.packs.is_empty(), "No packs configured");
        for (i, pack) in self.packs.iter().enumerate() {
            pack.validate(self.pack_sizes.as_ref())
                .with_context(|| format!("Invalid pack #{i} ({:?})", pack.retailer))?;
        }
        Ok(())
    }
}

impl ProductEntry {
    fn validate(&self, pack_sizes: Option<&BTreeSet<u32>>) -> Result<()> {
        ensure!(!self.retailer.trim().is_empty(), "retailer is empty");
        ensure!(!self.product_id.trim().is_empty(), "product_id is empty");
        ensure!(!self.url.trim().is_empty(), "url is empty");
        ensure!(self.pack_size > 0, "pack_size must be positive");
        if let Some(sizes) = pack_sizes {
            ensure!(
                sizes.contains(&self.pack_size),
                "pack_size {} is not one of {sizes:?}",
                self.pack_size
            );
        }
        for name in self.headers.keys() {
            ensure!(!name.trim().is_empty(), "empty header name");
        }
        if let Some(x) = &self.store_id {
            ensure!(!x.trim().is_empty(), "store_id is empty");
        }
        Ok(())
    }
}

// retailer ids show up as both numbers and strings in hand-written configs
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(x: RawId) -> Self {
        match x {
            RawId::Text(x) => x,
            RawId::Number(x) => x.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
