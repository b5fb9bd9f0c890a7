//! Interface de linha de comando do jobclient baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (create, status, await,
//! run) e flags globais (--base-url, --max-retries, --config, --verbose).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use jobclient::{AwaitOptions, PollMode};

/// jobclient: cria jobs e acompanha sua conclusão.
#[derive(Debug, Parser)]
#[command(name = "jobclient", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// URL base do servidor (sobrescreve arquivo e ambiente).
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Número máximo de retentativas por requisição.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Caminho para um arquivo de configuração TOML.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Modo de polling aceito pela CLI, mapeado para [`PollMode`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// O servidor responde imediatamente com o status atual.
    Short,
    /// O servidor segura a requisição até o job terminar ou sua espera expirar.
    Long,
}

impl From<ModeArg> for PollMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Short => PollMode::Short,
            ModeArg::Long => PollMode::Long,
        }
    }
}

/// Flags de polling compartilhadas por `await` e `run`.
#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    /// Estratégia de polling.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Orçamento total de espera em milissegundos.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Intervalo entre consultas em milissegundos.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}

impl PollArgs {
    /// Combina as flags com os defaults vindos da configuração.
    pub fn resolve(&self, defaults: AwaitOptions) -> AwaitOptions {
        AwaitOptions {
            mode: self.mode.map(PollMode::from).unwrap_or(defaults.mode),
            timeout_ms: self.timeout_ms.unwrap_or(defaults.timeout_ms),
            poll_interval_ms: self.poll_interval_ms.unwrap_or(defaults.poll_interval_ms),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cria um job no servidor.
    Create {
        /// Duração simulada do job em segundos.
        #[arg(long)]
        duration: f64,

        /// Faz o job terminar no estado `error`.
        #[arg(long, default_value_t = false)]
        should_error: bool,
    },

    /// Consulta o status atual de um job.
    Status {
        job_id: String,

        #[arg(long, value_enum, default_value = "short")]
        mode: ModeArg,
    },

    /// Aguarda um job existente chegar a um status terminal.
    Await {
        job_id: String,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Cria um job e aguarda sua conclusão.
    Run {
        /// Duração simulada do job em segundos.
        #[arg(long)]
        duration: f64,

        /// Faz o job terminar no estado `error`.
        #[arg(long, default_value_t = false)]
        should_error: bool,

        #[command(flatten)]
        poll: PollArgs,
    },
}
