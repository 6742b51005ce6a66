//! Command line entry point of busca-retrabalho
//!
//! Parses the arguments, runs one [`ReportPipeline`] and turns its events and
//! errors into notifications on the terminal. Exit code 0 means the CSV was
//! written (possibly partial after Ctrl+C); any fatal error exits with 1.

use busca_retrabalho::logging::{self, LogGuard};
use busca_retrabalho::utils::parse_iso_datetime;
use busca_retrabalho::{
    ApiConfig, Config, Error, Event, OutputConfig, ReportPipeline, RetrabalhoFilter, Stage,
    Urgency, cancel_on_signal,
};
use chrono::NaiveDateTime;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "busca-retrabalho",
    version,
    disable_version_flag = true,
    about = "Busca os retrabalhos lançados no sistema GTRP"
)]
struct Cli {
    /// Mostra a versão e sai
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Endereço da API Ex.: http://localhost:6543/
    #[arg(long, env = "BUSCA_RETRABALHO_HOST")]
    host: String,

    /// Usuário que será utilizado para acessar a API
    #[arg(short, long, env = "BUSCA_RETRABALHO_USER")]
    user: String,

    /// Senha do usuário
    #[arg(short, long, env = "BUSCA_RETRABALHO_PASSWORD", hide_env_values = true)]
    password: String,

    /// Data inicial da busca (ISO-8601, ex.: 2024-03-01 ou 2024-03-01T08:00:00)
    #[arg(long, value_parser = parse_date)]
    data_inicio: NaiveDateTime,

    /// Data final da busca (ISO-8601)
    #[arg(long, value_parser = parse_date)]
    data_fim: NaiveDateTime,

    /// Arquivo csv que será salvo
    #[arg(short, long, value_name = "ARQUIVO")]
    file_path: PathBuf,

    /// Separador de campos do arquivo csv
    #[arg(long, default_value_t = ',')]
    sep: char,

    /// Se especificado, retornará somente retrabalhos urgentes
    #[arg(long, conflicts_with = "nao_urgente")]
    urgente: bool,

    /// Se especificado, retornará somente retrabalhos NÃO urgentes
    #[arg(long)]
    nao_urgente: bool,

    /// Inclui retrabalhos inativos na busca
    #[arg(long)]
    incluir_inativos: bool,

    /// Número máximo de páginas buscadas
    #[arg(long, default_value_t = 1000)]
    max_paginas: u32,

    /// Timeout das requisições de dados, em segundos
    #[arg(long, value_name = "SEGUNDOS", default_value_t = 30)]
    timeout: u64,
}

impl Cli {
    fn config(&self) -> Config {
        let mut api = ApiConfig::new(&self.host, &self.user, &self.password);
        api.request_timeout = Duration::from_secs(self.timeout);

        let mut output = OutputConfig::new(&self.file_path);
        output.separator = self.sep;

        let mut config = Config::new(api, output);
        config.fetch.max_pages = self.max_paginas;
        config
    }

    fn filter(&self) -> RetrabalhoFilter {
        let mut filter = RetrabalhoFilter::new(self.data_inicio, self.data_fim);
        filter.urgency = match (self.urgente, self.nao_urgente) {
            (true, _) => Urgency::Urgent,
            (_, true) => Urgency::NotUrgent,
            _ => Urgency::Any,
        };
        filter.inactive = self.incluir_inativos;
        filter
    }
}

fn parse_date(value: &str) -> Result<NaiveDateTime, String> {
    parse_iso_datetime(value).ok_or_else(|| format!("data inválida: '{value}' (use ISO-8601)"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = match logging::init(&logging::default_log_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Aviso: log em arquivo desativado ({e})");
            None
        }
    };

    let code = run(&cli, log.as_ref()).await;
    drop(log);
    code
}

async fn run(cli: &Cli, log: Option<&LogGuard>) -> ExitCode {
    let mut pipeline = match ReportPipeline::new(cli.config()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            notify_error(&e, log);
            return ExitCode::FAILURE;
        }
    };

    let renderer = tokio::spawn(render_events(pipeline.subscribe()));
    let signals = tokio::spawn(cancel_on_signal(pipeline.cancellation_token()));

    let result = pipeline.run(&cli.filter()).await;

    // Releases the signal listener; the summary already recorded user cancellation.
    pipeline.cancellation_token().cancel();
    // Closing the channel ends the renderer once it has drained every event.
    drop(pipeline);
    renderer.await.ok();
    signals.await.ok();

    match result {
        Ok(summary) => {
            println!("Download finalizado!");
            if summary.cancelled {
                println!("Busca cancelada: o arquivo contém apenas os retrabalhos processados.");
            }
            println!("Lista de retrabalhos salva em: {}", summary.path.display());
            if let Some(log) = log {
                println!("Log completo em: {}", log.path().display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            notify_error(&e, log);
            ExitCode::FAILURE
        }
    }
}

fn notify_error(err: &Error, log: Option<&LogGuard>) {
    error!(error = %err, error_code = err.error_code(), "Report failed");

    eprintln!();
    eprintln!("{}", err.title());
    match err.api_message() {
        Some(message) => eprintln!("{message}"),
        None => eprintln!("{err}"),
    }
    if let Some(params) = err.query_params() {
        eprintln!("Parâmetros: {params}");
    }
    if let Some(log) = log {
        eprintln!("Log completo em: {}", log.path().display());
    }
}

async fn render_events(mut events: broadcast::Receiver<Event>) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            Event::PageFetched { page, total, .. } => {
                eprintln!("Página {page} recebida ({total} retrabalhos)");
            }
            Event::ProcessingRecord { index, total } => {
                eprint!("\rProcessando retrabalho {}/{}", index + 1, total);
                if index + 1 == total {
                    eprintln!();
                }
            }
            Event::LookupFailed {
                lookup,
                id_ordem,
                item_codigo,
                item_descricao,
                missing_columns,
                error,
            } => {
                eprintln!();
                eprintln!("{}", lookup.title());
                eprintln!("Ordem: {id_ordem}");
                eprintln!("Código: {item_codigo}");
                eprintln!("Descrição: {}", item_descricao.unwrap_or_default());
                eprintln!(
                    "As colunas {} ficarão vazias. ({error})",
                    missing_columns.join(", ")
                );
            }
            Event::Cancelled { stage } => {
                let stage = match stage {
                    Stage::Fetching => "busca",
                    Stage::Processing => "processamento",
                };
                eprintln!();
                eprintln!("Cancelado pelo usuário durante o {stage}");
            }
            Event::FetchingPage { .. } | Event::Completed { .. } => {}
        }
    }
}
