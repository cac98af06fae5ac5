//! Núcleo de workflow do SGC — Sistema de Gestão de Competências.
//!
//! A biblioteca decide o que cada perfil pode fazer com o subprocesso de
//! cada unidade, calcula a próxima situação de cada ação e deriva o
//! relatório de impacto das revisões. Ela não renderiza nada e não
//! armazena nada: persistência, autenticação e apresentação ficam com os
//! colaboradores externos declarados em [`orquestrador`].

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod impacto;
pub mod mapa;
pub mod orquestrador;
pub mod processo;
pub mod ui;
pub mod workflow;

pub use config::SgcConfig;
pub use error::SgcError;
pub use impacto::{ImpactoMapa, Mudanca, RegistroMudancas, TipoMudanca, calcular_impacto};
pub use mapa::{Atividade, Competencia, Conhecimento, validar_disponibilizacao};
pub use orquestrador::{ErroOrquestrador, Orquestrador, PayloadAcao, ResultadoAcao};
pub use processo::{Processo, Subprocesso, UnidadeParticipante};
pub use workflow::{
    AcaoBloco, AcaoWorkflow, Perfil, PermissoesSubprocesso, RelacaoHierarquica,
    SituacaoSubprocesso, TipoProcesso, resolver_permissoes, subprocessos_elegiveis, transicionar,
};
