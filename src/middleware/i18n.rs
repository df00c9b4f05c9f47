// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

// Idioma preferido do cliente, só o subtag primário ("pt-BR" -> "pt")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    .and_then(|tag| tag.split('-').next())
                    .map(|primary| primary.to_lowercase())
            })
            .filter(|lang| !lang.is_empty())
            .map(Locale)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Ok(Locale::from_header(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_primary_subtag_of_the_preferred_language() {
        assert_eq!(Locale::from_header(Some("pt-BR,pt;q=0.9,en;q=0.8")).0, "pt");
        assert_eq!(Locale::from_header(Some("en;q=0.5, pt;q=0.9")).0, "pt");
        assert_eq!(Locale::from_header(None).0, "en");
        assert_eq!(Locale::from_header(Some("")).0, "en");
    }
}
