use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, str::FromStr};

/// Default ceiling for folder-scoped uploads (10 MiB).
pub const DEFAULT_MAX_FOLDER_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which object-store implementation backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Remote S3 (or S3-compatible) bucket.
    S3,
    /// Process-local store, contents are lost on exit.
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown backend `{}` (expected `s3` or `memory`)", other),
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub backend: BackendKind,
    pub max_folder_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Folder-style HTTP gateway over an S3 bucket")]
pub struct Args {
    /// Host to bind to (overrides GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket holding every object (overrides S3_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (overrides S3_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Storage backend (overrides GATEWAY_BACKEND)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Size ceiling for folder uploads (overrides GATEWAY_MAX_FOLDER_UPLOAD_BYTES)
    #[arg(long)]
    pub max_folder_upload_bytes: Option<usize>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::resolve(args, |name| match env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("reading {}", name)),
        })
    }

    /// Merge parsed CLI args over values produced by `lookup`.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        let env_host = lookup("GATEWAY_HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("PORT")? {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            None => 3000,
        };
        let env_backend = match lookup("GATEWAY_BACKEND")? {
            Some(value) => value.parse::<BackendKind>()?,
            None => BackendKind::S3,
        };
        let env_max = match lookup("GATEWAY_MAX_FOLDER_UPLOAD_BYTES")? {
            Some(value) => value.parse::<usize>().with_context(|| {
                format!("parsing GATEWAY_MAX_FOLDER_UPLOAD_BYTES value `{}`", value)
            })?,
            None => DEFAULT_MAX_FOLDER_UPLOAD_BYTES,
        };
        let env_region = lookup("AWS_REGION")?.unwrap_or_else(|| "ap-south-1".into());
        let env_endpoint = lookup("S3_ENDPOINT_URL")?;
        let env_bucket = lookup("S3_BUCKET_NAME")?;

        let backend = args.backend.unwrap_or(env_backend);
        let bucket = match (args.bucket.or(env_bucket), backend) {
            (Some(bucket), _) if !bucket.trim().is_empty() => bucket,
            (_, BackendKind::Memory) => "local-bucket".into(),
            (_, BackendKind::S3) => {
                bail!("S3_BUCKET_NAME (or --bucket) is required for the s3 backend")
            }
        };

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket,
            region: args.region.unwrap_or(env_region),
            endpoint_url: args
                .endpoint_url
                .or(env_endpoint)
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            backend,
            max_folder_upload_bytes: args.max_folder_upload_bytes.unwrap_or(env_max),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<Option<String>> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| Ok(map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_bucket_is_set() {
        let cfg = AppConfig::resolve(Args::default(), env_of(&[("S3_BUCKET_NAME", "media")]))
            .unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.bucket, "media");
        assert_eq!(cfg.region, "ap-south-1");
        assert_eq!(cfg.backend, BackendKind::S3);
        assert_eq!(cfg.max_folder_upload_bytes, 10 * 1024 * 1024);
        assert!(cfg.endpoint_url.is_none());
    }

    #[test]
    fn missing_bucket_is_fatal_for_s3() {
        let err = AppConfig::resolve(Args::default(), env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET_NAME"));
    }

    #[test]
    fn memory_backend_does_not_need_a_bucket() {
        let cfg =
            AppConfig::resolve(Args::default(), env_of(&[("GATEWAY_BACKEND", "memory")])).unwrap();
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.bucket, "local-bucket");
    }

    #[test]
    fn cli_wins_over_environment() {
        let args = Args {
            port: Some(8080),
            region: Some("eu-west-1".into()),
            endpoint_url: Some("http://localhost:9000/".into()),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(
            args,
            env_of(&[
                ("PORT", "4000"),
                ("AWS_REGION", "us-east-1"),
                ("S3_BUCKET_NAME", "media"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.region, "eu-west-1");
        assert_eq!(cfg.endpoint_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn bad_port_reports_the_offending_value() {
        let err = AppConfig::resolve(
            Args::default(),
            env_of(&[("PORT", "eighty"), ("S3_BUCKET_NAME", "media")]),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("eighty"));
    }
}
