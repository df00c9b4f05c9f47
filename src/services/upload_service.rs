// src/services/upload_service.rs

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{common::error::AppError, models::attachment::Attachment};

pub const PUBLIC_PREFIX: &str = "/uploads";

const EVIDENCE_MIMES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];
const AVATAR_MIMES: [&str; 2] = ["image/jpeg", "image/png"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Evidência de tarefa com falha
    Evidence,
    Avatar,
}

/// Arquivo recebido no multipart, ainda só em memória.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Valida o tipo antes de qualquer coisa tocar o disco.
    pub fn check(&self, kind: UploadKind, upload: &PendingUpload) -> Result<(), AppError> {
        let mime = upload.content_type.to_ascii_lowercase();
        let accepted = match kind {
            UploadKind::Evidence => EVIDENCE_MIMES.contains(&mime.as_str()),
            UploadKind::Avatar => {
                AVATAR_MIMES.contains(&mime.as_str())
                    && extension_matches(&mime, &upload.file_name)
            }
        };
        if accepted {
            Ok(())
        } else {
            tracing::warn!(
                file = %upload.file_name,
                mime = %upload.content_type,
                ?kind,
                "Upload recusado"
            );
            Err(AppError::InvalidFileType)
        }
    }

    /// Grava como `<millis>-<nome saneado>` e devolve a referência pública.
    pub async fn save(&self, kind: UploadKind, upload: PendingUpload) -> Result<Attachment, AppError> {
        self.check(kind, &upload)?;
        self.ensure_dir().await?;

        let safe_name = sanitize_file_name(&upload.file_name);
        let millis = Utc::now().timestamp_millis();

        let mut attempt = 0u32;
        let (stored_name, file) = loop {
            let candidate = if attempt == 0 {
                format!("{}-{}", millis, safe_name)
            } else {
                format!("{}-{}-{}", millis, attempt, safe_name)
            };
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&candidate))
                .await
            {
                Ok(file) => break (candidate, file),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 16 => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        write_or_remove(file, &self.dir.join(&stored_name), &upload.bytes).await?;

        tracing::info!(file = %stored_name, bytes = upload.bytes.len(), "📎 Arquivo salvo");

        Ok(Attachment {
            filename: upload.file_name,
            url: format!("{}/{}", PUBLIC_PREFIX, stored_name),
            mime: upload.content_type,
        })
    }

    /// Remove o arquivo de um anexo. Arquivo ausente não é erro.
    pub async fn discard(&self, attachment: &Attachment) {
        let Some(name) = attachment.stored_name() else {
            return;
        };
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::info!(file = %name, "🗑️ Arquivo removido"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(file = %name, "Falha ao remover arquivo: {}", e),
        }
    }
}

/// Escreve e dá flush; se qualquer um falhar, o arquivo parcial é apagado.
async fn write_or_remove<W>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), AppError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        tracing::warn!(file = %path.display(), "Falha ao gravar upload: {}", e);
        let _ = tokio::fs::remove_file(path).await;
        return Err(e.into());
    }
    Ok(())
}

fn extension_matches(mime: &str, file_name: &str) -> bool {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match (mime, ext.as_deref()) {
        ("image/jpeg", Some("jpg" | "jpeg")) => true,
        ("image/png", Some("png")) => true,
        _ => false,
    }
}

/// Espaços viram `_`, assim como separadores de caminho e qualquer caractere fora de `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
