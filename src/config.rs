//! Configuração do mediagen carregada a partir de `mediagen.toml`.
//!
//! A struct [`MediaGenConfig`] contém todos os parâmetros configuráveis:
//! credenciais, parâmetros de geração de vídeo/imagem, tempos de polling
//! e endereço do servidor HTTP. Valores ausentes no arquivo usam defaults.
//! A variável de ambiente `BIGMODEL_API_KEY` tem precedência sobre o arquivo.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::bigmodel::client::API_URL;
use crate::error::MediaGenError;
use crate::job::{ImageParams, PollConfig, VideoParams};

pub const CONFIG_FILE: &str = "mediagen.toml";
pub const API_KEY_ENV: &str = "BIGMODEL_API_KEY";

/// Configuração de nível superior carregada de `mediagen.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaGenConfig {
    /// Chave da API BigModel.
    #[serde(default)]
    pub api_key: String,

    /// URL base da API (sem barra final).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Parâmetros fixos enviados em cada geração de vídeo.
    #[serde(default)]
    pub video: VideoParams,

    /// Parâmetros da geração de imagem.
    #[serde(default)]
    pub image: ImageParams,

    /// Orçamento de tempo e intervalo do polling.
    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Diretório onde `batch` salva os vídeos baixados.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

/// Configuração do servidor HTTP (`mediagen serve`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

// Valor padrão da URL base: API v4 pública.
fn default_base_url() -> String {
    API_URL.to_string()
}

// Valor padrão do endereço: todas as interfaces, porta 8001.
fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8001))
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

impl Default for MediaGenConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            video: VideoParams::default(),
            image: ImageParams::default(),
            poll: PollConfig::default(),
            server: ServerConfig::default(),
            download_dir: default_download_dir(),
        }
    }
}

impl MediaGenConfig {
    /// Carrega a configuração.
    ///
    /// Com `path` explícito o arquivo precisa existir; sem ele, usa
    /// `mediagen.toml` no diretório atual ou os valores padrão.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("config file not found: {}", path.display());
                }
                Self::from_file(path)?
            }
            None => {
                let default_path = Path::new(CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        // Variável de ambiente tem precedência sobre o arquivo para a chave API.
        config.apply_env_key(std::env::var(API_KEY_ENV).ok());
        config.poll.validate()?;

        tracing::debug!(
            base_url = %config.base_url,
            timeout_seconds = config.poll.timeout_seconds,
            interval_seconds = config.poll.interval_seconds,
            "Loaded configuration",
        );
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str::<MediaGenConfig>(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key
            && !key.is_empty()
        {
            self.api_key = key;
        }
    }

    /// Sobrescreve os tempos de polling (flags `--timeout` / `--interval`)
    /// e valida o resultado.
    pub fn override_poll(
        &mut self,
        timeout_seconds: Option<u64>,
        interval_seconds: Option<u64>,
    ) -> Result<(), MediaGenError> {
        self.poll = PollConfig::new(
            timeout_seconds.unwrap_or(self.poll.timeout_seconds),
            interval_seconds.unwrap_or(self.poll.interval_seconds),
        )?
        .with_query_retries(self.poll.query_retries);
        Ok(())
    }

    /// A chave da API, ou erro se nenhuma foi configurada.
    pub fn require_api_key(&self) -> Result<&str, MediaGenError> {
        if self.api_key.is_empty() {
            return Err(MediaGenError::Config(format!(
                "no API key configured; set {API_KEY_ENV} or `api_key` in {CONFIG_FILE}"
            )));
        }
        Ok(&self.api_key)
    }
}
