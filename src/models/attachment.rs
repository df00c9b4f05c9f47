// src/models/attachment.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Referência a um arquivo guardado no diretório de uploads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    /// Nome original enviado pelo cliente
    #[schema(example = "evidencia.pdf")]
    pub filename: String,

    #[schema(example = "/uploads/1767225600000-evidencia.pdf")]
    pub url: String,

    #[schema(example = "application/pdf")]
    pub mime: String,
}

impl Attachment {
    /// Nome do arquivo em disco, derivado da URL pública.
    pub fn stored_name(&self) -> Option<&str> {
        self.url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != "..")
    }
}
