mod bloco;
mod permissao;
mod situacao;
mod transicao;

pub use bloco::{AcaoBloco, FalhaBloco, ResultadoBloco, subprocessos_elegiveis};
pub use permissao::{Perfil, PermissoesSubprocesso, RelacaoHierarquica, resolver_permissoes};
pub use situacao::{SituacaoSubprocesso, TipoProcesso, situacoes_validas};
pub use transicao::{AcaoWorkflow, ErroTransicao, transicionar};
