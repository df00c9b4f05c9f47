// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens por idioma. Chaves vêm de `AppError::message_key`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let en = HashMap::from([
            ("no_token", "No token"),
            ("invalid_token", "Invalid token"),
            ("invalid_credentials", "Invalid credentials"),
            ("not_found", "{entity} not found"),
            ("attachment_required", "Evidence attachment is required when marking failed"),
            ("invalid_file_type", "Invalid file type"),
            ("email_exists", "Email already exists"),
            ("internal_error", "Internal server error"),
        ]);

        let pt = HashMap::from([
            ("no_token", "Token ausente"),
            ("invalid_token", "Token de autenticação inválido ou expirado"),
            ("invalid_credentials", "E-mail ou senha inválidos"),
            ("not_found", "{entity} não encontrado(a)"),
            ("attachment_required", "Um anexo de evidência é obrigatório para marcar como falha"),
            ("invalid_file_type", "Tipo de arquivo inválido"),
            ("email_exists", "Este e-mail já está em uso"),
            ("internal_error", "Ocorreu um erro inesperado"),
        ]);

        Self {
            catalogs: HashMap::from([("en", en), ("pt", pt)]),
        }
    }

    /// Busca a mensagem no idioma pedido, caindo para o inglês.
    pub fn translate(&self, lang: &str, key: &str) -> Option<&'static str> {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .copied()
    }

    #[cfg(test)]
    pub fn supports(&self, lang: &str) -> bool {
        self.catalogs.contains_key(lang)
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "invalid_credentials"), Some("Invalid credentials"));
        assert!(!store.supports("de"));
        assert_eq!(store.translate("en", "nope"), None);
    }
}
