//! Interface de linha de comando do mediagen baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (video, image, status,
//! batch, serve) e flags globais (--config, --timeout, --interval, --json,
//! --verbose).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mediagen: geração de imagens e vídeos com polling de jobs assíncronos.
#[derive(Debug, Parser)]
#[command(name = "mediagen", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./mediagen.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Orçamento máximo de espera por job, em segundos.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Intervalo fixo entre consultas de status, em segundos.
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Imprime o job final como JSON.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Habilita logs detalhados (debug).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Gera um vídeo e aguarda a conclusão.
    Video {
        /// Descrição do vídeo a gerar.
        prompt: String,

        /// Baixa o vídeo gerado para este diretório.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Gera uma imagem (síncrono).
    Image {
        /// Descrição da imagem a gerar.
        prompt: String,
    },

    /// Consulta o status de um job uma única vez.
    Status {
        /// Identificador do job retornado na submissão.
        job_id: String,
    },

    /// Gera um vídeo por prompt, em sequência, salvando cada um como video{i}.mp4.
    Batch {
        /// Prompts, um por vídeo.
        #[arg(required = true)]
        prompts: Vec<String>,

        /// Diretório de destino (padrão: `download_dir` da configuração).
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Sobe o serviço HTTP com o endpoint /gen_media.
    Serve {
        /// Endereço de escuta (padrão: `server.addr` da configuração).
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_video_subcommand() {
        let cli = Cli::parse_from(["mediagen", "video", "interstellar black hole"]);
        match cli.command {
            Command::Video { prompt, out } => {
                assert_eq!(prompt, "interstellar black hole");
                assert!(out.is_none());
            }
            _ => panic!("expected Video command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "mediagen",
            "--timeout",
            "60",
            "--interval",
            "2",
            "--json",
            "--verbose",
            "status",
            "task-1",
        ]);
        assert!(cli.verbose);
        assert!(cli.json);
        assert_eq!(cli.timeout, Some(60));
        assert_eq!(cli.interval, Some(2));
        assert!(matches!(cli.command, Command::Status { job_id } if job_id == "task-1"));
    }

    #[test]
    fn cli_parses_batch_prompts() {
        let cli = Cli::parse_from(["mediagen", "batch", "one", "two", "three", "--out", "clips"]);
        match cli.command {
            Command::Batch { prompts, out } => {
                assert_eq!(prompts, vec!["one", "two", "three"]);
                assert_eq!(out, Some(PathBuf::from("clips")));
            }
            _ => panic!("expected Batch command"),
        }
    }

    #[test]
    fn cli_batch_requires_a_prompt() {
        assert!(Cli::try_parse_from(["mediagen", "batch"]).is_err());
    }

    #[test]
    fn cli_parses_serve_addr() {
        let cli = Cli::parse_from(["mediagen", "serve", "--addr", "127.0.0.1:9000"]);
        match cli.command {
            Command::Serve { addr } => assert_eq!(addr, Some("127.0.0.1:9000".parse().unwrap())),
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
