//! Interface de terminal do mediagen: spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`JobProgress`] acompanha visualmente
//! o polling de um job no terminal.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::{BatchItem, BatchOutcome};
use crate::job::{GenerationJob, JobStatus};

/// Indicador visual de progresso para o polling de um job no terminal.
///
/// Exibe um spinner animado enquanto o job está em andamento e mensagens
/// coloridas para sucesso (verde), falha (vermelho) e timeout (amarelo).
pub struct JobProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl JobProgress {
    /// Inicia o spinner com o prompt e retorna a instância de progresso.
    pub fn start(prompt: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} [{elapsed}] {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("SUBMIT: {prompt}"));
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Atualiza a mensagem do spinner com o status atual do job.
    pub fn update(&self, job: &GenerationJob) {
        self.pb
            .set_message(format!("{} job {} (query {})", job.status, job.id, job.queries));
    }

    /// Finaliza o spinner e exibe o resultado final do job.
    pub fn complete(&self, job: &GenerationJob) {
        self.pb.finish_and_clear();
        match job.status {
            JobStatus::Success => println!(
                "  {} Video ready: {}",
                self.green.apply_to("✓"),
                job.result_url.as_deref().unwrap_or_default()
            ),
            _ => println!(
                "  {} Video generation failed (job {})",
                self.red.apply_to("✗"),
                job.id
            ),
        }
    }

    /// Finaliza o spinner após timeout ou erro.
    pub fn abort(&self, message: &str, timed_out: bool) {
        self.pb.finish_and_clear();
        if timed_out {
            println!("  {} {message}", self.yellow.apply_to("⏱"));
        } else {
            println!("  {} {message}", self.red.apply_to("✗"));
        }
    }
}

/// Imprime o resumo de um lote, uma linha por prompt.
pub fn print_batch_summary(items: &[BatchItem]) {
    let green = Style::new().green().bold();
    let red = Style::new().red().bold();
    let yellow = Style::new().yellow();

    println!();
    println!("{}", Style::new().bold().apply_to("─── Batch Summary ───"));
    for item in items {
        let mark = match item.outcome {
            BatchOutcome::Saved { .. } => green.apply_to("✓"),
            BatchOutcome::TimedOut { .. } => yellow.apply_to("⏱"),
            _ => red.apply_to("✗"),
        };
        println!("  {mark} [{}] {}: {}", item.index, item.prompt, item.outcome);
    }
}

/// Imprime um job como JSON formatado.
pub fn print_job_json(job: &GenerationJob) {
    println!("{}", serde_json::to_string_pretty(job).unwrap_or_default());
}
