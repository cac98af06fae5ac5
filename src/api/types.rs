//! Tipos de dados para requisições e respostas do backend REST do SGC.
//!
//! As entidades de domínio (subprocesso, mudança, atividade, competência)
//! já derivam `Serialize`/`Deserialize` e trafegam diretamente; aqui ficam
//! apenas os envelopes próprios do protocolo.

use serde::{Deserialize, Serialize};

use crate::workflow::{RelacaoHierarquica, SituacaoSubprocesso};

/// Corpo do `PUT /subprocessos/{id}/situacao`.
///
/// O backend só aplica a gravação se a situação armazenada ainda for
/// `esperada`; caso contrário responde 409 e nada muda.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GravarSituacaoRequest {
    pub esperada: SituacaoSubprocesso,
    pub nova: SituacaoSubprocesso,
}

/// Resposta do `GET /unidades/{a}/relacao/{b}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelacaoResponse {
    pub relacao: RelacaoHierarquica,
}

/// Resposta do `GET /unidades/{id}/descendentes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescendentesResponse {
    pub unidades: Vec<u64>,
}
