// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};

/// Arredonda para centavos (igual ao NUMERIC(10,2) do Postgres).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `R$ 1234.50`, `- R$ 10.00` para negativos.
pub fn format_brl(value: Decimal) -> String {
    let rounded = round_money(value);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("- R$ {:.2}", rounded.abs())
    } else {
        format!("R$ {:.2}", rounded.abs())
    }
}

/// Percentual com uma casa (`42.5%`).
pub fn format_percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(10005, 3)), Decimal::new(1001, 2));
        assert_eq!(round_money(Decimal::new(-10005, 3)), Decimal::new(-1001, 2));
    }

    #[test]
    fn formats_reais() {
        assert_eq!(format_brl(Decimal::new(123450, 2)), "R$ 1234.50");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0.00");
        assert_eq!(format_brl(Decimal::new(-1000, 2)), "- R$ 10.00");
        assert_eq!(format_percent(Decimal::new(4256, 2)), "42.6%");
    }
}
