use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of process a unit participates in.
///
/// Mapeamento and Revisão each carry a full subprocess track; Diagnóstico
/// has no staged workflow of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoProcesso {
    Mapeamento,
    Revisao,
    Diagnostico,
}

impl fmt::Display for TipoProcesso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TipoProcesso::Mapeamento => write!(f, "MAPEAMENTO"),
            TipoProcesso::Revisao => write!(f, "REVISAO"),
            TipoProcesso::Diagnostico => write!(f, "DIAGNOSTICO"),
        }
    }
}

/// The situation of a subprocess inside its parent process.
///
/// Mapeamento track:
/// NAO_INICIADO → CADASTRO_EM_ANDAMENTO → CADASTRO_DISPONIBILIZADO →
/// CADASTRO_HOMOLOGADO → MAPA_CRIADO → MAPA_DISPONIBILIZADO →
/// {MAPA_VALIDADO | MAPA_COM_SUGESTOES} → MAPA_HOMOLOGADO
///
/// Revisão mirrors the same shape with a REVISAO_ prefix plus
/// REVISAO_MAPA_AJUSTADO between the map-edit and map-review stages,
/// reached only through a devolução.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SituacaoSubprocesso {
    NaoIniciado,

    CadastroEmAndamento,
    CadastroDisponibilizado,
    CadastroHomologado,
    MapaCriado,
    MapaDisponibilizado,
    MapaValidado,
    MapaComSugestoes,
    MapaHomologado,

    RevisaoCadastroEmAndamento,
    RevisaoCadastroDisponibilizado,
    RevisaoCadastroHomologado,
    RevisaoMapaCriado,
    RevisaoMapaAjustado,
    RevisaoMapaDisponibilizado,
    RevisaoMapaValidado,
    RevisaoMapaComSugestoes,
    RevisaoMapaHomologado,
}

use SituacaoSubprocesso::*;

/// Ordered mapeamento track. `MapaValidado` and `MapaComSugestoes` are
/// alternatives occupying the same position in the progression.
const TRILHA_MAPEAMENTO: &[SituacaoSubprocesso] = &[
    NaoIniciado,
    CadastroEmAndamento,
    CadastroDisponibilizado,
    CadastroHomologado,
    MapaCriado,
    MapaDisponibilizado,
    MapaValidado,
    MapaComSugestoes,
    MapaHomologado,
];

/// Ordered revisão track.
const TRILHA_REVISAO: &[SituacaoSubprocesso] = &[
    NaoIniciado,
    RevisaoCadastroEmAndamento,
    RevisaoCadastroDisponibilizado,
    RevisaoCadastroHomologado,
    RevisaoMapaCriado,
    RevisaoMapaAjustado,
    RevisaoMapaDisponibilizado,
    RevisaoMapaValidado,
    RevisaoMapaComSugestoes,
    RevisaoMapaHomologado,
];

/// Returns the ordered list of situations a subprocess of the given process
/// type can assume. Diagnóstico subprocesses never leave `NAO_INICIADO`.
pub fn situacoes_validas(tipo: TipoProcesso) -> &'static [SituacaoSubprocesso] {
    match tipo {
        TipoProcesso::Mapeamento => TRILHA_MAPEAMENTO,
        TipoProcesso::Revisao => TRILHA_REVISAO,
        TipoProcesso::Diagnostico => &[NaoIniciado],
    }
}

impl SituacaoSubprocesso {
    /// True only for the final homologated map situation of each track.
    pub fn is_terminal(self) -> bool {
        matches!(self, MapaHomologado | RevisaoMapaHomologado)
    }

    /// Whether this situation belongs to the given process type's track.
    pub fn pertence_ao_tipo(self, tipo: TipoProcesso) -> bool {
        situacoes_validas(tipo).contains(&self)
    }

    /// Position of this situation in its track's progression. The two
    /// validation outcomes share a position. `None` when the situation is
    /// not part of the given track.
    pub fn posicao(self, tipo: TipoProcesso) -> Option<u8> {
        let pos = match (tipo, self) {
            (TipoProcesso::Mapeamento, NaoIniciado) => 0,
            (TipoProcesso::Mapeamento, CadastroEmAndamento) => 1,
            (TipoProcesso::Mapeamento, CadastroDisponibilizado) => 2,
            (TipoProcesso::Mapeamento, CadastroHomologado) => 3,
            (TipoProcesso::Mapeamento, MapaCriado) => 4,
            (TipoProcesso::Mapeamento, MapaDisponibilizado) => 5,
            (TipoProcesso::Mapeamento, MapaValidado | MapaComSugestoes) => 6,
            (TipoProcesso::Mapeamento, MapaHomologado) => 7,

            (TipoProcesso::Revisao, NaoIniciado) => 0,
            (TipoProcesso::Revisao, RevisaoCadastroEmAndamento) => 1,
            (TipoProcesso::Revisao, RevisaoCadastroDisponibilizado) => 2,
            (TipoProcesso::Revisao, RevisaoCadastroHomologado) => 3,
            (TipoProcesso::Revisao, RevisaoMapaCriado) => 4,
            (TipoProcesso::Revisao, RevisaoMapaAjustado) => 5,
            (TipoProcesso::Revisao, RevisaoMapaDisponibilizado) => 6,
            (TipoProcesso::Revisao, RevisaoMapaValidado | RevisaoMapaComSugestoes) => 7,
            (TipoProcesso::Revisao, RevisaoMapaHomologado) => 8,

            (TipoProcesso::Diagnostico, NaoIniciado) => 0,
            _ => return None,
        };
        Some(pos)
    }

    /// The cadastro-in-progress situation of the given track, if the track
    /// has one.
    pub fn cadastro_em_andamento_da_trilha(tipo: TipoProcesso) -> Option<SituacaoSubprocesso> {
        match tipo {
            TipoProcesso::Mapeamento => Some(CadastroEmAndamento),
            TipoProcesso::Revisao => Some(RevisaoCadastroEmAndamento),
            TipoProcesso::Diagnostico => None,
        }
    }
}

impl fmt::Display for SituacaoSubprocesso {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nome = match self {
            NaoIniciado => "NAO_INICIADO",
            CadastroEmAndamento => "CADASTRO_EM_ANDAMENTO",
            CadastroDisponibilizado => "CADASTRO_DISPONIBILIZADO",
            CadastroHomologado => "CADASTRO_HOMOLOGADO",
            MapaCriado => "MAPA_CRIADO",
            MapaDisponibilizado => "MAPA_DISPONIBILIZADO",
            MapaValidado => "MAPA_VALIDADO",
            MapaComSugestoes => "MAPA_COM_SUGESTOES",
            MapaHomologado => "MAPA_HOMOLOGADO",
            RevisaoCadastroEmAndamento => "REVISAO_CADASTRO_EM_ANDAMENTO",
            RevisaoCadastroDisponibilizado => "REVISAO_CADASTRO_DISPONIBILIZADO",
            RevisaoCadastroHomologado => "REVISAO_CADASTRO_HOMOLOGADO",
            RevisaoMapaCriado => "REVISAO_MAPA_CRIADO",
            RevisaoMapaAjustado => "REVISAO_MAPA_AJUSTADO",
            RevisaoMapaDisponibilizado => "REVISAO_MAPA_DISPONIBILIZADO",
            RevisaoMapaValidado => "REVISAO_MAPA_VALIDADO",
            RevisaoMapaComSugestoes => "REVISAO_MAPA_COM_SUGESTOES",
            RevisaoMapaHomologado => "REVISAO_MAPA_HOMOLOGADO",
        };
        write!(f, "{nome}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapeamento_track_is_ordered() {
        let trilha = situacoes_validas(TipoProcesso::Mapeamento);
        assert_eq!(trilha.first(), Some(&NaoIniciado));
        assert_eq!(trilha.last(), Some(&MapaHomologado));
        for janela in trilha.windows(2) {
            let a = janela[0].posicao(TipoProcesso::Mapeamento).unwrap();
            let b = janela[1].posicao(TipoProcesso::Mapeamento).unwrap();
            assert!(a <= b, "{} deveria vir antes de {}", janela[0], janela[1]);
        }
    }

    #[test]
    fn revisao_track_has_ajustado_before_disponibilizado() {
        let ajustado = RevisaoMapaAjustado.posicao(TipoProcesso::Revisao).unwrap();
        let disponibilizado = RevisaoMapaDisponibilizado
            .posicao(TipoProcesso::Revisao)
            .unwrap();
        assert_eq!(ajustado + 1, disponibilizado);
    }

    #[test]
    fn only_homologado_is_terminal() {
        for &s in situacoes_validas(TipoProcesso::Mapeamento) {
            assert_eq!(s.is_terminal(), s == MapaHomologado);
        }
        for &s in situacoes_validas(TipoProcesso::Revisao) {
            assert_eq!(s.is_terminal(), s == RevisaoMapaHomologado);
        }
    }

    #[test]
    fn validation_outcomes_share_a_position() {
        assert_eq!(
            MapaValidado.posicao(TipoProcesso::Mapeamento),
            MapaComSugestoes.posicao(TipoProcesso::Mapeamento)
        );
        assert_eq!(
            RevisaoMapaValidado.posicao(TipoProcesso::Revisao),
            RevisaoMapaComSugestoes.posicao(TipoProcesso::Revisao)
        );
    }

    #[test]
    fn tracks_do_not_cross() {
        assert!(!CadastroEmAndamento.pertence_ao_tipo(TipoProcesso::Revisao));
        assert!(!RevisaoMapaAjustado.pertence_ao_tipo(TipoProcesso::Mapeamento));
        assert!(NaoIniciado.pertence_ao_tipo(TipoProcesso::Mapeamento));
        assert!(NaoIniciado.pertence_ao_tipo(TipoProcesso::Revisao));
        assert!(NaoIniciado.pertence_ao_tipo(TipoProcesso::Diagnostico));
    }

    #[test]
    fn diagnostico_never_progresses() {
        assert_eq!(situacoes_validas(TipoProcesso::Diagnostico), &[NaoIniciado]);
        assert_eq!(MapaCriado.posicao(TipoProcesso::Diagnostico), None);
    }

    #[test]
    fn situacao_display_wire_names() {
        assert_eq!(NaoIniciado.to_string(), "NAO_INICIADO");
        assert_eq!(CadastroDisponibilizado.to_string(), "CADASTRO_DISPONIBILIZADO");
        assert_eq!(
            RevisaoMapaComSugestoes.to_string(),
            "REVISAO_MAPA_COM_SUGESTOES"
        );
    }

    #[test]
    fn situacao_serde_matches_display() {
        let json = serde_json::to_string(&RevisaoMapaAjustado).unwrap();
        assert_eq!(json, "\"REVISAO_MAPA_AJUSTADO\"");
        let de: SituacaoSubprocesso = serde_json::from_str("\"MAPA_COM_SUGESTOES\"").unwrap();
        assert_eq!(de, MapaComSugestoes);
    }
}
