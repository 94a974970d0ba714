// src/services/pricing.rs
//
// Cálculo de totais da venda. Funções puras: o serviço de vendas busca os
// subtotais no banco e grava o resultado.

use rust_decimal::Decimal;

use crate::common::money::round_money;
use crate::models::sales::{AdjustmentType, Sale, UpdateSaleAdjustmentsPayload};

/// Taxa de comissão padrão do vendedor (5%).
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaleAdjustments {
    pub discount_value: Decimal,
    pub discount_type: AdjustmentType,
    pub tax_value: Decimal,
    pub tax_type: AdjustmentType,
}

impl From<&Sale> for SaleAdjustments {
    fn from(sale: &Sale) -> Self {
        Self {
            discount_value: sale.discount_value,
            discount_type: sale.discount_type,
            tax_value: sale.tax_value,
            tax_type: sale.tax_type,
        }
    }
}

impl From<&UpdateSaleAdjustmentsPayload> for SaleAdjustments {
    fn from(payload: &UpdateSaleAdjustmentsPayload) -> Self {
        Self {
            discount_value: payload.discount_value,
            discount_type: payload.discount_type,
            tax_value: payload.tax_value,
            tax_type: payload.tax_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub commission: Decimal,
}

pub fn line_subtotal(price: Decimal, quantity: i32) -> Decimal {
    round_money(price * Decimal::from(quantity))
}

/// Valor efetivo do desconto/acréscimo: fixo em reais ou percentual do subtotal.
pub fn adjustment_amount(kind: AdjustmentType, value: Decimal, subtotal: Decimal) -> Decimal {
    match kind {
        AdjustmentType::Fixed => round_money(value),
        AdjustmentType::Percent => round_money(subtotal * value / Decimal::ONE_HUNDRED),
    }
}

/// total = Σ subtotais - desconto + acréscimo (nunca negativo); comissão sobre o total.
pub fn compute_totals<I>(subtotals: I, adjustments: &SaleAdjustments, commission_rate: Decimal) -> SaleTotals
where
    I: IntoIterator<Item = Decimal>,
{
    let subtotal: Decimal = subtotals.into_iter().sum();
    let discount = adjustment_amount(adjustments.discount_type, adjustments.discount_value, subtotal);
    let tax = adjustment_amount(adjustments.tax_type, adjustments.tax_value, subtotal);

    let total = round_money((subtotal - discount + tax).max(Decimal::ZERO));
    let commission = round_money(total * commission_rate);

    SaleTotals { subtotal, discount, tax, total, commission }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn default_commission_is_five_percent() {
        assert_eq!(DEFAULT_COMMISSION_RATE, Decimal::new(5, 2));
    }

    #[test]
    fn line_subtotal_multiplies_price() {
        assert_eq!(line_subtotal(money(14990), 2), money(29980));
    }

    #[test]
    fn fixed_discount_and_percent_tax() {
        let adjustments = SaleAdjustments {
            discount_value: money(1000),
            discount_type: AdjustmentType::Fixed,
            tax_value: Decimal::new(10, 0),
            tax_type: AdjustmentType::Percent,
        };
        let totals = compute_totals([money(10000), money(5000)], &adjustments, DEFAULT_COMMISSION_RATE);

        assert_eq!(totals.subtotal, money(15000));
        assert_eq!(totals.discount, money(1000));
        assert_eq!(totals.tax, money(1500));
        assert_eq!(totals.total, money(15500));
        assert_eq!(totals.commission, money(775));
    }

    #[test]
    fn percent_discount_rounds_half_away_from_zero() {
        let adjustments = SaleAdjustments {
            discount_value: Decimal::new(15, 0),
            discount_type: AdjustmentType::Percent,
            ..Default::default()
        };
        // 15% de 33.33 = 4.9995 -> 5.00
        let totals = compute_totals([money(3333)], &adjustments, DEFAULT_COMMISSION_RATE);
        assert_eq!(totals.discount, money(500));
        assert_eq!(totals.total, money(2833));
        // 5% de 28.33 = 1.4165 -> 1.42
        assert_eq!(totals.commission, money(142));
    }

    #[test]
    fn total_never_goes_negative() {
        let adjustments = SaleAdjustments {
            discount_value: money(50000),
            discount_type: AdjustmentType::Fixed,
            ..Default::default()
        };
        let totals = compute_totals([money(10000)], &adjustments, DEFAULT_COMMISSION_RATE);
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.commission, Decimal::ZERO);
    }

    #[test]
    fn empty_sale_totals_zero() {
        let totals = compute_totals(Vec::new(), &SaleAdjustments::default(), DEFAULT_COMMISSION_RATE);
        assert_eq!(totals.total, Decimal::ZERO);
    }
}
