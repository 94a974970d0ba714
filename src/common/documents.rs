// src/common/documents.rs
//
// Validação e formatação de CPF (11 dígitos) e CNPJ (14 dígitos).

use crate::common::error::AppError;

const CNPJ_WEIGHTS_1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

fn digits_of(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_equal(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn is_valid_cpf(raw: &str) -> bool {
    let digits = digits_of(raw);
    if digits.len() != 11 || all_equal(&digits) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        (sum * 10 % 11) % 10
    };

    check(9) == digits[9] && check(10) == digits[10]
}

pub fn is_valid_cnpj(raw: &str) -> bool {
    let digits = digits_of(raw);
    if digits.len() != 14 || all_equal(&digits) {
        return false;
    }

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            rem if rem < 2 => 0,
            rem => 11 - rem,
        }
    };

    check(&CNPJ_WEIGHTS_1) == digits[12] && check(&CNPJ_WEIGHTS_2) == digits[13]
}

/// Valida e devolve o documento formatado:
/// CPF `000.000.000-00`, CNPJ `00.000.000/0000-00`.
pub fn normalize_cpf_cnpj(raw: &str) -> Result<String, AppError> {
    let numbers: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    match numbers.len() {
        11 => {
            if !is_valid_cpf(&numbers) {
                return Err(AppError::InvalidDocument("CPF inválido.".into()));
            }
            Ok(format!(
                "{}.{}.{}-{}",
                &numbers[..3], &numbers[3..6], &numbers[6..9], &numbers[9..]
            ))
        }
        14 => {
            if !is_valid_cnpj(&numbers) {
                return Err(AppError::InvalidDocument("CNPJ inválido.".into()));
            }
            Ok(format!(
                "{}.{}.{}/{}-{}",
                &numbers[..2], &numbers[2..5], &numbers[5..8], &numbers[8..12], &numbers[12..]
            ))
        }
        _ => Err(AppError::InvalidDocument(
            "O documento deve ter 11 (CPF) ou 14 (CNPJ) dígitos.".into(),
        )),
    }
}

/// Campo opcional: vazio/ausente vira `None`, o resto é validado.
pub fn normalize_optional(raw: Option<&str>) -> Result<Option<String>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => normalize_cpf_cnpj(value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_cpf_check_digits() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("11144477735"));
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.111.111-11"));
        assert!(!is_valid_cpf("1234"));
    }

    #[test]
    fn validates_cnpj_check_digits() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(is_valid_cnpj("11444777000161"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("00000000000000"));
    }

    #[test]
    fn formats_valid_documents() {
        assert_eq!(normalize_cpf_cnpj("52998224725").unwrap(), "529.982.247-25");
        assert_eq!(normalize_cpf_cnpj(" 11222333000181 ").unwrap(), "11.222.333/0001-81");
    }

    #[test]
    fn rejects_wrong_length_and_bad_checksum() {
        assert!(matches!(normalize_cpf_cnpj("123"), Err(AppError::InvalidDocument(_))));
        assert!(matches!(normalize_cpf_cnpj("52998224724"), Err(AppError::InvalidDocument(_))));
    }

    #[test]
    fn optional_documents_accept_blank() {
        assert_eq!(normalize_optional(None).unwrap(), None);
        assert_eq!(normalize_optional(Some("  ")).unwrap(), None);
        assert_eq!(normalize_optional(Some("529.982.247-25")).unwrap().as_deref(), Some("529.982.247-25"));
    }
}
