// src/models/fields.rs

// Helpers de (de)serialização para o que o navegador manda:
// strings vazias no lugar de "sem valor" e tags como texto separado por vírgula.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::ValidationError;

/// Query string: `?status=` vira `None`.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map(Some).map_err(de::Error::custom),
    }
}

/// Campo "limpável" de um PATCH-like.
///
/// Ausente → `None` (não mexe), `null`/`""` → `Some(None)` (limpa), valor → `Some(Some(v))`.
/// Precisa de `#[serde(default)]` no campo para que a ausência chegue como `None`.
pub fn clearable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    Ok(Some(parse_clearable(opt.as_deref()).map_err(de::Error::custom)?))
}

/// Mesma regra de `clearable`, para campos de formulário multipart.
pub fn parse_clearable<T>(raw: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::from_str(s).map(Some).map_err(|e| e.to_string()),
    }
}

/// Lista de tags. Aceita `["a", "b"]` ou `"a, b"`.
///
/// Espaços são aparados e itens vazios descartados; duplicatas são mantidas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TagList(pub Vec<String>);

impl TagList {
    pub fn parse_csv(raw: &str) -> Self {
        Self::normalize(raw.split(','))
    }

    fn normalize<'a>(items: impl IntoIterator<Item = &'a str>) -> Self {
        TagList(
            items
                .into_iter()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'de> Deserialize<'de> for TagList {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Csv(String),
            List(Vec<String>),
        }

        Ok(match Raw::deserialize(de)? {
            Raw::Csv(s) => TagList::parse_csv(&s),
            Raw::List(items) => TagList::normalize(items.iter().map(String::as_str)),
        })
    }
}

/// Validador: rejeita texto vazio ou só com espaços.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
