use std::fmt;

use serde::{Deserialize, Serialize};

use super::situacao::{SituacaoSubprocesso, TipoProcesso};
use super::transicao::AcaoWorkflow;

/// Role of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Perfil {
    Admin,
    Gestor,
    Chefe,
    Servidor,
}

impl fmt::Display for Perfil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perfil::Admin => write!(f, "ADMIN"),
            Perfil::Gestor => write!(f, "GESTOR"),
            Perfil::Chefe => write!(f, "CHEFE"),
            Perfil::Servidor => write!(f, "SERVIDOR"),
        }
    }
}

/// How the acting user's unit relates to the unit owning the subprocess.
///
/// Computed by the caller from the org tree; the resolver never walks the
/// hierarchy itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelacaoHierarquica {
    SameUnit,
    Ancestor,
    Descendant,
    Unrelated,
}

/// The fixed-shape permission record for one (user, subprocess) pair.
///
/// Absence of permission is always expressed as `false`, never as an
/// error: a caller outside the hierarchy simply gets the all-false record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissoesSubprocesso {
    pub pode_editar_cadastro: bool,
    pub pode_disponibilizar_cadastro: bool,
    pub pode_devolver_cadastro: bool,
    pub pode_aceitar_cadastro: bool,
    pub pode_homologar_cadastro: bool,
    pub pode_editar_mapa: bool,
    pub pode_disponibilizar_mapa: bool,
    pub pode_validar_mapa: bool,
    pub pode_apresentar_sugestoes: bool,
    pub pode_devolver_mapa: bool,
    pub pode_aceitar_mapa: bool,
    pub pode_homologar_mapa: bool,
    pub pode_visualizar_impacto: bool,
    pub pode_alterar_data_limite: bool,
    pub pode_reabrir_cadastro: bool,
    pub pode_reabrir_revisao: bool,
    pub pode_enviar_lembrete: bool,
}

impl PermissoesSubprocesso {
    /// The record with every flag off, returned for read-only callers.
    pub fn nenhuma() -> Self {
        Self::default()
    }

    /// Whether this record enables the given workflow action.
    /// `CriarMapa` is map editing and is gated by `pode_editar_mapa`.
    pub fn permite(&self, acao: AcaoWorkflow) -> bool {
        match acao {
            AcaoWorkflow::DisponibilizarCadastro => self.pode_disponibilizar_cadastro,
            AcaoWorkflow::DevolverCadastro => self.pode_devolver_cadastro,
            AcaoWorkflow::AceitarCadastro => self.pode_aceitar_cadastro,
            AcaoWorkflow::HomologarCadastro => self.pode_homologar_cadastro,
            AcaoWorkflow::CriarMapa => self.pode_editar_mapa,
            AcaoWorkflow::DisponibilizarMapa => self.pode_disponibilizar_mapa,
            AcaoWorkflow::ApresentarSugestoes => self.pode_apresentar_sugestoes,
            AcaoWorkflow::ValidarMapa { .. } => self.pode_validar_mapa,
            AcaoWorkflow::DevolverMapa => self.pode_devolver_mapa,
            AcaoWorkflow::AceitarMapa => self.pode_aceitar_mapa,
            AcaoWorkflow::HomologarMapa => self.pode_homologar_mapa,
            AcaoWorkflow::ReabrirCadastro => self.pode_reabrir_cadastro,
            AcaoWorkflow::ReabrirRevisao => self.pode_reabrir_revisao,
        }
    }

    /// True when no flag is set.
    pub fn vazia(&self) -> bool {
        *self == Self::default()
    }
}

/// Resolves the permission record for a role looking at a subprocess in the
/// given situation.
///
/// The matrix in short form:
/// - CHEFE of the owning unit edits and submits the cadastro, and validates
///   or contests the mapa once it is made available to the unit.
/// - GESTOR of an ancestor unit accepts or devolves what subordinates
///   submitted, and may nudge them with lembretes.
/// - ADMIN homologates cadastros and mapas anywhere, builds and submits the
///   mapa, reopens already-submitted cadastros/revisões, and manages
///   deadlines.
/// - SERVIDOR, descendants and unrelated units get the all-false record.
pub fn resolver_permissoes(
    perfil: Perfil,
    situacao: SituacaoSubprocesso,
    relacao: RelacaoHierarquica,
    tipo: TipoProcesso,
) -> PermissoesSubprocesso {
    use SituacaoSubprocesso::*;

    if matches!(
        relacao,
        RelacaoHierarquica::Unrelated | RelacaoHierarquica::Descendant
    ) {
        return PermissoesSubprocesso::nenhuma();
    }
    if !situacao.pertence_ao_tipo(tipo) || tipo == TipoProcesso::Diagnostico {
        return PermissoesSubprocesso::nenhuma();
    }

    let mut p = PermissoesSubprocesso::nenhuma();
    let em_revisao = tipo == TipoProcesso::Revisao;
    // Impact reports only exist for revision flows with an open cadastro.
    let impacto_disponivel = em_revisao && situacao != NaoIniciado;

    match perfil {
        Perfil::Servidor => {}

        Perfil::Chefe => {
            if relacao != RelacaoHierarquica::SameUnit {
                return p;
            }
            match situacao {
                NaoIniciado | CadastroEmAndamento | RevisaoCadastroEmAndamento => {
                    p.pode_editar_cadastro = true;
                    p.pode_disponibilizar_cadastro = situacao != NaoIniciado;
                }
                MapaDisponibilizado | RevisaoMapaDisponibilizado => {
                    p.pode_validar_mapa = true;
                    p.pode_apresentar_sugestoes = true;
                }
                MapaComSugestoes | RevisaoMapaComSugestoes => {
                    p.pode_apresentar_sugestoes = true;
                }
                _ => {}
            }
            p.pode_visualizar_impacto = impacto_disponivel;
        }

        Perfil::Gestor => {
            if relacao != RelacaoHierarquica::Ancestor {
                return p;
            }
            match situacao {
                CadastroDisponibilizado | RevisaoCadastroDisponibilizado => {
                    p.pode_aceitar_cadastro = true;
                    p.pode_devolver_cadastro = true;
                }
                MapaValidado | MapaComSugestoes | RevisaoMapaValidado
                | RevisaoMapaComSugestoes => {
                    p.pode_aceitar_mapa = true;
                    p.pode_devolver_mapa = true;
                }
                _ => {}
            }
            p.pode_enviar_lembrete = !situacao.is_terminal();
            p.pode_visualizar_impacto = impacto_disponivel;
        }

        Perfil::Admin => {
            match situacao {
                CadastroDisponibilizado | RevisaoCadastroDisponibilizado => {
                    p.pode_homologar_cadastro = true;
                }
                MapaValidado | MapaComSugestoes | RevisaoMapaValidado
                | RevisaoMapaComSugestoes => {
                    p.pode_homologar_mapa = true;
                }
                _ => {}
            }
            // The competency map is built by the administration after the
            // cadastro is homologated, and reworked after devoluções.
            match situacao {
                CadastroHomologado | RevisaoCadastroHomologado => {
                    p.pode_editar_mapa = true;
                }
                MapaCriado | RevisaoMapaCriado | RevisaoMapaAjustado => {
                    p.pode_editar_mapa = true;
                    p.pode_disponibilizar_mapa = true;
                }
                _ => {}
            }
            p.pode_reabrir_cadastro = !em_revisao
                && matches!(situacao, CadastroDisponibilizado | CadastroHomologado);
            p.pode_reabrir_revisao = em_revisao
                && matches!(
                    situacao,
                    RevisaoCadastroDisponibilizado | RevisaoCadastroHomologado
                );
            p.pode_alterar_data_limite = !situacao.is_terminal();
            p.pode_enviar_lembrete = !situacao.is_terminal();
            p.pode_visualizar_impacto = impacto_disponivel;
        }
    }

    p
}
