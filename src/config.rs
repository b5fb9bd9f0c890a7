//! Configuração do cliente carregada a partir de `jobclient.toml`.
//!
//! A struct [`ClientConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `JOBCLIENT_BASE_URL` tem precedência sobre o arquivo.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::poller::AwaitOptions;
use crate::retry::RetryPolicy;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "jobclient.toml";

/// Variável de ambiente que sobrescreve `base_url`.
pub const BASE_URL_ENV: &str = "JOBCLIENT_BASE_URL";

/// Configuração de nível superior carregada de `jobclient.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// URL base do servidor de jobs.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Máximo de retentativas por requisição.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Atraso base em milissegundos para backoff exponencial.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Teto para um único atraso de backoff, em milissegundos.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Se respostas 5xx devem ser retentadas.
    #[serde(default = "default_true")]
    pub retry_on_server_error: bool,

    /// Timeout de conexão em segundos.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Timeout total de cada requisição HTTP em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Opções de polling padrão (`[poll]`).
    #[serde(default)]
    pub poll: AwaitOptions,
}

// Valor padrão para a URL base: servidor local na porta 8000.
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

// Valor padrão para retentativas máximas: 3.
fn default_max_retries() -> u32 {
    3
}

// Valor padrão para o atraso base: 100ms.
fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// Long polling segura a requisição no servidor; o timeout precisa ser folgado.
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            retry_on_server_error: default_true(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            poll: AwaitOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Carrega a configuração de `jobclient.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::read_file(path)?
        } else {
            Self::default()
        };
        Ok(config.with_base_url_override(std::env::var(BASE_URL_ENV).ok()))
    }

    /// Carrega a configuração de um arquivo explícito. O arquivo precisa existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Self::read_file(path)?;
        Ok(config.with_base_url_override(std::env::var(BASE_URL_ENV).ok()))
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<ClientConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Aplica a URL vinda do ambiente; valores vazios são ignorados.
    pub fn with_base_url_override(mut self, value: Option<String>) -> Self {
        if let Some(url) = value
            && !url.trim().is_empty()
        {
            self.base_url = url;
        }
        self
    }

    /// Política de retentativa derivada desta configuração.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            retry_on_server_error: self.retry_on_server_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PollMode;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 100);
        assert!(config.retry_on_server_error);
        assert_eq!(config.poll, AwaitOptions::default());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            base_url = "http://jobs.example.com"
            max_retries = 5

            [poll]
            mode = "short"
            poll_interval_ms = 250
        "#;
        let config: ClientConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.base_url, "http://jobs.example.com");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay_ms, 100);
        assert_eq!(config.poll.mode, PollMode::Short);
        assert_eq!(config.poll.poll_interval_ms, 250);
        assert_eq!(config.poll.timeout_ms, 30_000);
    }

    #[test]
    fn retry_policy_mirrors_config() {
        let config = ClientConfig {
            max_retries: 1,
            base_delay_ms: 50,
            max_delay_ms: 400,
            retry_on_server_error: false,
            ..Default::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.base_delay_ms, 50);
        assert_eq!(policy.max_delay_ms, 400);
        assert!(!policy.retry_on_server_error);
    }

    #[test]
    fn base_url_override() {
        let config = ClientConfig::default().with_base_url_override(Some("http://other:1".into()));
        assert_eq!(config.base_url, "http://other:1");

        let config = ClientConfig::default().with_base_url_override(Some("  ".into()));
        assert_eq!(config.base_url, "http://localhost:8000");

        let config = ClientConfig::default().with_base_url_override(None);
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_retries = 0\nrequest_timeout_secs = 5").unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn load_from_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_retries = \"many\"").unwrap();

        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ClientConfig::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
