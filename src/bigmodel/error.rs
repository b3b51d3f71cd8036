//! Tipos de erro para o cliente da API BigModel.
//!
//! Define [`BigModelError`] com variantes para rate limiting, erros da API,
//! erros de rede e respostas incompletas. Usa `thiserror` para derivar
//! `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API BigModel.
#[derive(Debug, Error)]
pub enum BigModelError {
    /// O servidor retornou HTTP 429 (rate limit).
    /// `retry_after_ms` indica quanto esperar antes de retentar.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Erro retornado pela API (ex.: 401 chave inválida, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout) ou corpo
    /// de resposta impossível de decodificar.
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A resposta foi aceita, mas falta um campo obrigatório.
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
}

impl BigModelError {
    /// Se uma nova tentativa da mesma chamada pode ter sucesso.
    ///
    /// Rate limits, erros 5xx e falhas de transporte são transitórios;
    /// erros 4xx e respostas indecodificáveis não são.
    pub fn is_transient(&self) -> bool {
        match self {
            BigModelError::RateLimited { .. } => true,
            BigModelError::ApiError { status, .. } => *status >= 500,
            BigModelError::NetworkError(e) => !e.is_decode(),
            BigModelError::MissingField(_) => false,
        }
    }
}
