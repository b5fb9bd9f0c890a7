//! Interface de terminal do jobclient: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`PollProgress`] acompanha visualmente
//! a espera pela conclusão de um job no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use jobclient::{CreateJobResponse, JobClientError, JobStatus, PollMode};

/// Indicador visual de progresso enquanto um job é acompanhado.
///
/// Exibe um spinner animado durante o polling e mensagens coloridas para
/// conclusão (verde), erro do job ou falha do cliente (vermelho).
pub struct PollProgress {
    // Spinner do indicatif.
    pb: ProgressBar,
    // Estilo verde para jobs concluídos.
    green: Style,
    // Estilo vermelho para erros.
    red: Style,
    // Estilo amarelo para o job id.
    yellow: Style,
}

impl PollProgress {
    /// Inicia o spinner para o job e retorna a instância de progresso.
    pub fn start(job_id: &str, mode: PollMode) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        let yellow = Style::new().yellow();
        pb.set_message(format!(
            "Waiting for job {} ({mode} polling)",
            yellow.apply_to(job_id)
        ));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow,
        }
    }

    /// Finaliza o spinner e exibe o status terminal do job.
    pub fn finish(&self, job_id: &str, status: JobStatus) {
        self.pb.finish_and_clear();
        match status {
            JobStatus::Completed => println!(
                "  {} Job {} completed",
                self.green.apply_to("✓"),
                self.yellow.apply_to(job_id)
            ),
            JobStatus::Error | JobStatus::Pending => println!(
                "  {} Job {} ended with status '{status}'",
                self.red.apply_to("✗"),
                self.yellow.apply_to(job_id)
            ),
        }
    }

    /// Finaliza o spinner e exibe a falha do cliente.
    pub fn fail(&self, err: &JobClientError) {
        self.pb.finish_and_clear();
        eprintln!("  {} {}: {err}", self.red.apply_to("✗"), err.kind());
    }
}

/// Imprime o job recém-criado.
pub fn print_created(created: &CreateJobResponse) {
    println!(
        "Job created with ID: {}, initial status: {}",
        Style::new().yellow().apply_to(&created.job_id),
        created.status
    );
}
