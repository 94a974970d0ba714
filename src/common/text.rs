// src/common/text.rs

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Remove acentos e coloca em minúsculo ("Limão" -> "limao").
/// O Postgres não tem `unaccent` habilitado por padrão, então a busca é feita aqui.
pub fn normalize(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Verifica se algum dos campos contém a busca (já normalizada).
pub fn matches_any(query_norm: &str, fields: &[Option<&str>]) -> bool {
    if query_norm.is_empty() {
        return true;
    }
    fields
        .iter()
        .flatten()
        .any(|field| normalize(field).contains(query_norm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize("Limão Siciliano"), "limao siciliano");
        assert_eq!(normalize("FOUGÈRE"), "fougere");
        assert_eq!(normalize("Cítrico"), "citrico");
    }

    #[test]
    fn matches_against_optional_fields() {
        let q = normalize("acqua");
        assert!(matches_any(&q, &[Some("Acqua di Giò"), None]));
        assert!(matches_any(&normalize("789"), &[Some("Perfume"), Some("7891234")]));
        assert!(!matches_any(&q, &[Some("Malbec"), None]));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches_any("", &[None]));
    }
}
