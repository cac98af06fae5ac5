//! Tipos de erro para o cliente da API do SGC.
//!
//! Define [`ApiError`] com variantes para erros HTTP e falhas de rede.
//! Usa `thiserror` para derivar `Display` e `Error` a partir dos
//! atributos `#[error(...)]`.

use thiserror::Error;

use crate::orquestrador::ErroColaborador;

/// Erros que podem ocorrer ao interagir com o backend REST do SGC.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Erro retornado pela API (ex.: 401 token inválido, 404 subprocesso
    /// inexistente, 500 erro interno). Contém o código de status HTTP e a
    /// mensagem do corpo da resposta.
    #[error("API error (status {status}): {message}")]
    Http { status: u16, message: String },

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    /// Encapsula o erro original do `reqwest` via `#[from]`.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<ApiError> for ErroColaborador {
    fn from(erro: ApiError) -> Self {
        ErroColaborador(erro.to_string())
    }
}
