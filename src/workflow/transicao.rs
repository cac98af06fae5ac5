use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::situacao::{SituacaoSubprocesso, TipoProcesso};

/// Every workflow action a subprocess can receive.
///
/// `ValidarMapa` carries the caller-supplied flag telling whether the unit
/// still has unresolved sugestões; that flag decides between the two
/// validation outcomes. `ReabrirCadastro`/`ReabrirRevisao` are the
/// ADMIN-only irregular backward jumps, distinct from the single-step
/// devolução.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcaoWorkflow {
    DisponibilizarCadastro,
    DevolverCadastro,
    AceitarCadastro,
    HomologarCadastro,
    CriarMapa,
    DisponibilizarMapa,
    ApresentarSugestoes,
    ValidarMapa { com_sugestoes: bool },
    DevolverMapa,
    AceitarMapa,
    HomologarMapa,
    ReabrirCadastro,
    ReabrirRevisao,
}

impl AcaoWorkflow {
    /// Stable identifier of the action, independent of any carried data.
    pub fn nome(self) -> &'static str {
        match self {
            AcaoWorkflow::DisponibilizarCadastro => "DISPONIBILIZAR_CADASTRO",
            AcaoWorkflow::DevolverCadastro => "DEVOLVER_CADASTRO",
            AcaoWorkflow::AceitarCadastro => "ACEITAR_CADASTRO",
            AcaoWorkflow::HomologarCadastro => "HOMOLOGAR_CADASTRO",
            AcaoWorkflow::CriarMapa => "CRIAR_MAPA",
            AcaoWorkflow::DisponibilizarMapa => "DISPONIBILIZAR_MAPA",
            AcaoWorkflow::ApresentarSugestoes => "APRESENTAR_SUGESTOES",
            AcaoWorkflow::ValidarMapa { .. } => "VALIDAR_MAPA",
            AcaoWorkflow::DevolverMapa => "DEVOLVER_MAPA",
            AcaoWorkflow::AceitarMapa => "ACEITAR_MAPA",
            AcaoWorkflow::HomologarMapa => "HOMOLOGAR_MAPA",
            AcaoWorkflow::ReabrirCadastro => "REABRIR_CADASTRO",
            AcaoWorkflow::ReabrirRevisao => "REABRIR_REVISAO",
        }
    }

    /// Devoluções and reaberturas must carry a written justification.
    pub fn exige_motivo(self) -> bool {
        matches!(
            self,
            AcaoWorkflow::DevolverCadastro
                | AcaoWorkflow::DevolverMapa
                | AcaoWorkflow::ReabrirCadastro
                | AcaoWorkflow::ReabrirRevisao
        )
    }
}

impl fmt::Display for AcaoWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nome())
    }
}

/// Why a transition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErroTransicao {
    /// The action exists but is not defined for the current situation.
    #[error("ação {acao} não é permitida na situação {situacao}")]
    InvalidForState {
        situacao: SituacaoSubprocesso,
        acao: &'static str,
    },

    /// The situation or the action belongs to the other process track.
    #[error("ação {acao} não se aplica a um processo de tipo {tipo}")]
    InvalidForTipo {
        tipo: TipoProcesso,
        acao: &'static str,
    },
}

/// Computes the situation that results from applying `acao` to a subprocess
/// currently at `atual` inside a process of type `tipo`.
///
/// Pure: never reads or writes subprocess records. The caller persists the
/// returned situation together with any domain side effects (motivo of a
/// devolução, who accepted, and so on).
///
/// Backward moves are the devoluções, each stepping back exactly one
/// position in the track order, and the ADMIN reaberturas. Everything else
/// is strictly forward. `AceitarCadastro`/`AceitarMapa` keep the situation
/// unchanged: acceptance moves review responsibility upward without
/// advancing the stage.
pub fn transicionar(
    atual: SituacaoSubprocesso,
    acao: AcaoWorkflow,
    tipo: TipoProcesso,
) -> Result<SituacaoSubprocesso, ErroTransicao> {
    use AcaoWorkflow as A;
    use SituacaoSubprocesso::*;

    if tipo == TipoProcesso::Diagnostico {
        return Err(ErroTransicao::InvalidForTipo {
            tipo,
            acao: acao.nome(),
        });
    }
    if !atual.pertence_ao_tipo(tipo) {
        return Err(ErroTransicao::InvalidForTipo {
            tipo,
            acao: acao.nome(),
        });
    }
    // Each reabrir action is tied to its own track.
    match (acao, tipo) {
        (A::ReabrirCadastro, TipoProcesso::Revisao)
        | (A::ReabrirRevisao, TipoProcesso::Mapeamento) => {
            return Err(ErroTransicao::InvalidForTipo {
                tipo,
                acao: acao.nome(),
            });
        }
        _ => {}
    }

    let nova = match (atual, acao) {
        // Cadastro stage, mapeamento.
        (CadastroEmAndamento, A::DisponibilizarCadastro) => CadastroDisponibilizado,
        (CadastroDisponibilizado, A::DevolverCadastro) => CadastroEmAndamento,
        (CadastroDisponibilizado, A::AceitarCadastro) => CadastroDisponibilizado,
        (CadastroDisponibilizado, A::HomologarCadastro) => CadastroHomologado,
        (CadastroDisponibilizado | CadastroHomologado, A::ReabrirCadastro) => CadastroEmAndamento,

        // Mapa stage, mapeamento.
        (CadastroHomologado, A::CriarMapa) => MapaCriado,
        (MapaCriado, A::DisponibilizarMapa) => MapaDisponibilizado,
        (MapaDisponibilizado, A::ValidarMapa { com_sugestoes: false }) => MapaValidado,
        (MapaDisponibilizado, A::ValidarMapa { com_sugestoes: true }) => MapaComSugestoes,
        (MapaDisponibilizado | MapaComSugestoes, A::ApresentarSugestoes) => MapaComSugestoes,
        (MapaDisponibilizado, A::DevolverMapa) => MapaCriado,
        (MapaValidado | MapaComSugestoes, A::DevolverMapa) => MapaDisponibilizado,
        (MapaValidado, A::AceitarMapa) => MapaValidado,
        (MapaComSugestoes, A::AceitarMapa) => MapaComSugestoes,
        (MapaValidado | MapaComSugestoes, A::HomologarMapa) => MapaHomologado,

        // Cadastro stage, revisão.
        (RevisaoCadastroEmAndamento, A::DisponibilizarCadastro) => RevisaoCadastroDisponibilizado,
        (RevisaoCadastroDisponibilizado, A::DevolverCadastro) => RevisaoCadastroEmAndamento,
        (RevisaoCadastroDisponibilizado, A::AceitarCadastro) => RevisaoCadastroDisponibilizado,
        (RevisaoCadastroDisponibilizado, A::HomologarCadastro) => RevisaoCadastroHomologado,
        (
            RevisaoCadastroDisponibilizado | RevisaoCadastroHomologado,
            A::ReabrirRevisao,
        ) => RevisaoCadastroEmAndamento,

        // Mapa stage, revisão. A devolved map goes to AJUSTADO and is
        // re-submitted from there.
        (RevisaoCadastroHomologado, A::CriarMapa) => RevisaoMapaCriado,
        (RevisaoMapaCriado | RevisaoMapaAjustado, A::DisponibilizarMapa) => {
            RevisaoMapaDisponibilizado
        }
        (RevisaoMapaDisponibilizado, A::ValidarMapa { com_sugestoes: false }) => RevisaoMapaValidado,
        (RevisaoMapaDisponibilizado, A::ValidarMapa { com_sugestoes: true }) => {
            RevisaoMapaComSugestoes
        }
        (RevisaoMapaDisponibilizado | RevisaoMapaComSugestoes, A::ApresentarSugestoes) => {
            RevisaoMapaComSugestoes
        }
        (RevisaoMapaDisponibilizado, A::DevolverMapa) => RevisaoMapaAjustado,
        (RevisaoMapaValidado | RevisaoMapaComSugestoes, A::DevolverMapa) => {
            RevisaoMapaDisponibilizado
        }
        (RevisaoMapaValidado, A::AceitarMapa) => RevisaoMapaValidado,
        (RevisaoMapaComSugestoes, A::AceitarMapa) => RevisaoMapaComSugestoes,
        (RevisaoMapaValidado | RevisaoMapaComSugestoes, A::HomologarMapa) => RevisaoMapaHomologado,

        _ => {
            return Err(ErroTransicao::InvalidForState {
                situacao: atual,
                acao: acao.nome(),
            });
        }
    };

    Ok(nova)
}
