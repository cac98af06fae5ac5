pub mod client;
pub mod error;
pub mod types;

pub use client::SgcApiClient;
pub use error::ApiError;
pub use types::{DescendentesResponse, GravarSituacaoRequest, RelacaoResponse};
