//! Interface de linha de comando do SGC baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (situacao, impacto,
//! bloco, demo) e flags globais (--perfil, --unidade, --verbose).

use clap::{Parser, Subcommand, ValueEnum};

use crate::workflow::{AcaoBloco, Perfil};

/// SGC — Workflow de mapeamento de competências organizacionais.
#[derive(Debug, Parser)]
#[command(name = "sgc", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Perfil assumido nesta sessão.
    #[arg(long, global = true)]
    pub perfil: Option<PerfilArg>,

    /// Código da unidade do usuário.
    #[arg(long, global = true)]
    pub unidade: Option<u64>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Perfil aceito pela CLI, mapeado para [`Perfil`] internamente.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PerfilArg {
    /// Administrador do processo (homologações e reaberturas).
    Admin,
    /// Gestor de unidade intermediária (aceites e devoluções).
    Gestor,
    /// Chefe da unidade (cadastro e validação do mapa).
    Chefe,
    /// Servidor da unidade (somente leitura).
    Servidor,
}

impl From<PerfilArg> for Perfil {
    fn from(arg: PerfilArg) -> Self {
        match arg {
            PerfilArg::Admin => Perfil::Admin,
            PerfilArg::Gestor => Perfil::Gestor,
            PerfilArg::Chefe => Perfil::Chefe,
            PerfilArg::Servidor => Perfil::Servidor,
        }
    }
}

/// Ação em bloco aceita pela CLI.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AcaoBlocoArg {
    /// Aceitar cadastros/mapas pendentes das unidades subordinadas.
    Aceitar,
    /// Homologar cadastros/mapas pendentes em todo o sistema.
    Homologar,
}

impl From<AcaoBlocoArg> for AcaoBloco {
    fn from(arg: AcaoBlocoArg) -> Self {
        match arg {
            AcaoBlocoArg::Aceitar => AcaoBloco::Aceitar,
            AcaoBlocoArg::Homologar => AcaoBloco::Homologar,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mostra a árvore de unidades de um snapshot de processo (JSON).
    Situacao {
        /// Caminho do arquivo JSON com o processo.
        arquivo: String,
    },

    /// Calcula o relatório de impacto de um snapshot de revisão (JSON).
    Impacto {
        /// Caminho do arquivo JSON com mudanças e competências.
        arquivo: String,
    },

    /// Consulta no backend a situação e as permissões de um subprocesso.
    Consultar {
        /// Código do subprocesso no backend.
        subprocesso: u64,
    },

    /// Lista as unidades elegíveis para uma ação em bloco.
    Bloco {
        /// Caminho do arquivo JSON com o processo.
        arquivo: String,

        /// Ação em bloco desejada.
        #[arg(value_enum)]
        acao: AcaoBlocoArg,
    },

    /// Executa a demonstração embutida do workflow.
    Demo,
}
