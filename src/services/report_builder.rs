// src/services/report_builder.rs
//
// Monta os relatórios tabulares {título, cabeçalhos, linhas, resumo} a partir
// das linhas já agregadas pelo banco.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::common::money::{format_brl, format_percent, round_money};
use crate::models::finance::{Transaction, TransactionKind, TransactionStatus};
use crate::models::reports::{
    BalanceSheetFigures, GroupedTotalRow, ReportData, ReportKind, SalesMetrics, TabularReport,
};

pub const NO_CUSTOMER: &str = "Consumidor Final";
pub const NO_BRAND: &str = "Sem Marca";
pub const NO_SALESPERSON: &str = "Sistema";

const DATE_TIME: &str = "%d/%m/%Y %H:%M";
const DATE: &str = "%d/%m/%Y";

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|h| h.to_string()).collect()
}

fn or_default(name: Option<&str>, fallback: &str) -> String {
    name.filter(|n| !n.is_empty()).unwrap_or(fallback).to_string()
}

/// lucro / receita * 100; 0 quando não há receita.
pub fn margin(profit: Decimal, revenue: Decimal) -> Decimal {
    if revenue > Decimal::ZERO {
        profit / revenue * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

pub fn sales_metrics(total_revenue: Decimal, total_count: i64, total_cost: Decimal) -> SalesMetrics {
    let avg_ticket = if total_count > 0 {
        round_money(total_revenue / Decimal::from(total_count))
    } else {
        Decimal::ZERO
    };
    let gross_profit = total_revenue - total_cost;

    SalesMetrics {
        total_revenue,
        total_count,
        avg_ticket,
        total_cost,
        gross_profit,
        profit_margin: round_money(margin(gross_profit, total_revenue)),
    }
}

fn grouped_rows(rows: &[GroupedTotalRow], fallback: &str) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| vec![or_default(r.label.as_deref(), fallback), r.quantity.to_string(), format_brl(r.total)])
        .collect()
}

fn transaction_value(t: &Transaction) -> String {
    match t.kind {
        TransactionKind::Expense => format_brl(-t.value),
        TransactionKind::Income => format_brl(t.value),
    }
}

/// Saldo do período: só o que foi pago entra.
pub fn paid_balance(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Paid)
        .map(|t| match t.kind {
            TransactionKind::Income => t.value,
            TransactionKind::Expense => -t.value,
        })
        .sum()
}

fn balance_sheet(figures: &BalanceSheetFigures) -> (Vec<Vec<String>>, Decimal) {
    let assets = figures.stock_value + figures.receivables + figures.cash_balance;
    let equity = assets - figures.payables;

    let row = |account: &str, kind: &str, value: Decimal| {
        vec![account.to_string(), kind.to_string(), format_brl(value)]
    };

    let rows = vec![
        row("Estoque (Custo)", "Ativo", figures.stock_value),
        row("Contas a Receber", "Ativo", figures.receivables),
        row("Saldo em Caixa", "Ativo", figures.cash_balance),
        row("Contas a Pagar", "Passivo", figures.payables),
        row("Patrimônio Líquido Estimado", "Resultado", equity),
    ];
    (rows, assets)
}

pub fn build_report(data: ReportData) -> TabularReport {
    let mut summary = BTreeMap::new();

    let (kind, title, headers, rows) = match data {
        ReportData::Sales(sales) => {
            let total: Decimal = sales.iter().map(|s| s.total).sum();
            summary.insert("total_vendas".to_string(), format_brl(total));
            let rows = sales
                .iter()
                .map(|s| {
                    vec![
                        s.number.to_string(),
                        s.created_at.format(DATE_TIME).to_string(),
                        or_default(s.customer_name.as_deref(), NO_CUSTOMER),
                        s.status.label_pt().to_string(),
                        s.payment_method.label_pt().to_string(),
                        format_brl(s.total),
                    ]
                })
                .collect();
            (
                ReportKind::Sales,
                "Relatório Geral de Vendas",
                headers(&["ID", "Data", "Cliente", "Status", "Pagamento", "Total"]),
                rows,
            )
        }
        ReportData::Pending(sales) => {
            let total: Decimal = sales.iter().map(|s| s.total).sum();
            summary.insert("total_pendente".to_string(), format_brl(total));
            let rows = sales
                .iter()
                .map(|s| {
                    vec![
                        s.number.to_string(),
                        s.created_at.format(DATE_TIME).to_string(),
                        or_default(s.customer_name.as_deref(), NO_CUSTOMER),
                        s.products.clone(),
                        s.total_quantity.to_string(),
                        format_brl(s.total),
                    ]
                })
                .collect();
            (
                ReportKind::Pending,
                "Relatório de Vendas Pendentes / Orçamentos",
                headers(&["ID", "Data", "Cliente", "Produtos", "Qtd. Total", "Valor Total"]),
                rows,
            )
        }
        ReportData::Inventory(products) => {
            let mut total_cost = Decimal::ZERO;
            let mut total_sale = Decimal::ZERO;
            let rows = products
                .iter()
                .map(|p| {
                    let qty = Decimal::from(p.stock_quantity);
                    let line_cost = qty * p.cost_price;
                    let line_sale = qty * p.selling_price;
                    total_cost += line_cost;
                    total_sale += line_sale;
                    vec![
                        p.name.clone(),
                        or_default(p.brand_name.as_deref(), "-"),
                        p.stock_quantity.to_string(),
                        format_brl(p.cost_price),
                        format_brl(p.selling_price),
                        format_brl(line_cost),
                        format_brl(line_sale),
                    ]
                })
                .collect();
            summary.insert("custo_total".to_string(), format_brl(total_cost));
            summary.insert("venda_total".to_string(), format_brl(total_sale));
            summary.insert("lucro_potencial".to_string(), format_brl(total_sale - total_cost));
            (
                ReportKind::Inventory,
                "Relatório de Estoque e Valoração",
                headers(&["Produto", "Marca", "Estoque", "Custo Unit.", "Venda Unit.", "Total Custo", "Total Venda"]),
                rows,
            )
        }
        ReportData::BestSellers(items) => (
            ReportKind::BestSellers,
            "Produtos Mais Vendidos",
            headers(&["Produto", "Qtd. Vendida", "Receita Total"]),
            grouped_rows(&items, "-"),
        ),
        ReportData::SalesByCustomer(groups) => (
            ReportKind::SalesByCustomer,
            "Vendas por Cliente",
            headers(&["Cliente", "Qtd. Compras", "Total Gasto"]),
            grouped_rows(&groups, NO_CUSTOMER),
        ),
        ReportData::SalesByBrand(groups) => (
            ReportKind::SalesByBrand,
            "Vendas por Marca",
            headers(&["Marca", "Qtd. Itens", "Total Vendido"]),
            grouped_rows(&groups, NO_BRAND),
        ),
        ReportData::SalesByUser(groups) => (
            ReportKind::SalesByUser,
            "Vendas por Vendedor",
            headers(&["Vendedor", "Qtd. Vendas", "Total Vendido"]),
            grouped_rows(&groups, NO_SALESPERSON),
        ),
        ReportData::SalesByPayment(stats) => {
            let rows = stats
                .iter()
                .map(|s| vec![s.payment_method.label_pt().to_string(), s.count.to_string(), format_brl(s.total)])
                .collect();
            (
                ReportKind::SalesByPayment,
                "Vendas por Forma de Pagamento",
                headers(&["Forma de Pagamento", "Qtd. Vendas", "Total"]),
                rows,
            )
        }
        ReportData::ProfitByProduct(mut products) => {
            products.sort_by(|a, b| (b.revenue - b.cost).cmp(&(a.revenue - a.cost)));
            let mut total_profit = Decimal::ZERO;
            let rows = products
                .iter()
                .map(|p| {
                    let profit = p.revenue - p.cost;
                    total_profit += profit;
                    vec![
                        p.name.clone(),
                        p.quantity.to_string(),
                        format_brl(p.revenue),
                        format_brl(p.cost),
                        format_brl(profit),
                        format_percent(margin(profit, p.revenue)),
                    ]
                })
                .collect();
            summary.insert("lucro_total_produtos".to_string(), format_brl(total_profit));
            (
                ReportKind::ProfitByProduct,
                "Relatório de Lucro por Produto",
                headers(&["Produto", "Qtd Vendida", "Receita Total", "Custo Total", "Lucro Bruto", "Margem %"]),
                rows,
            )
        }
        ReportData::ProfitBySale(sales) => {
            let mut total_profit = Decimal::ZERO;
            let rows = sales
                .iter()
                .map(|s| {
                    let profit = s.total - s.cost;
                    total_profit += profit;
                    vec![
                        s.number.to_string(),
                        s.created_at.format(DATE).to_string(),
                        or_default(s.customer_name.as_deref(), NO_CUSTOMER),
                        format_brl(s.total),
                        format_brl(s.cost),
                        format_brl(profit),
                        format_percent(margin(profit, s.total)),
                    ]
                })
                .collect();
            summary.insert("lucro_liquido_periodo".to_string(), format_brl(total_profit));
            (
                ReportKind::ProfitBySale,
                "Relatório de Lucro por Venda",
                headers(&["ID Venda", "Data", "Cliente", "Total Venda", "Custo Produtos", "Lucro", "Margem %"]),
                rows,
            )
        }
        ReportData::CashFlow(transactions) => {
            summary.insert("saldo_periodo".to_string(), format_brl(paid_balance(&transactions)));
            let rows = transactions
                .iter()
                .map(|t| {
                    vec![
                        t.payment_date.map(|d| d.format(DATE).to_string()).unwrap_or_else(|| "-".to_string()),
                        t.description.clone(),
                        t.kind.label_pt().to_string(),
                        transaction_value(t),
                        t.status.label_pt().to_string(),
                    ]
                })
                .collect();
            (
                ReportKind::CashFlow,
                "Movimento do Caixa (Entradas e Saídas)",
                headers(&["Data", "Descrição", "Tipo", "Valor", "Status"]),
                rows,
            )
        }
        ReportData::FinancialExpenses(expenses) => {
            let total: Decimal = expenses.iter().map(|t| t.value).sum();
            summary.insert("total_despesas".to_string(), format_brl(total));
            let rows = expenses
                .iter()
                .map(|t| {
                    vec![
                        t.due_date.format(DATE).to_string(),
                        t.description.clone(),
                        format_brl(t.value),
                        t.status.label_pt().to_string(),
                    ]
                })
                .collect();
            (
                ReportKind::FinancialExpenses,
                "Relatório de Despesas",
                headers(&["Vencimento", "Descrição", "Valor", "Status"]),
                rows,
            )
        }
        ReportData::BalanceSheet(figures) => {
            let (rows, assets) = balance_sheet(&figures);
            summary.insert("ativo_total".to_string(), format_brl(assets));
            (
                ReportKind::BalanceSheet,
                "Balanço Patrimonial Simplificado (Posição Atual)",
                headers(&["Conta", "Tipo", "Valor"]),
                rows,
            )
        }
    };

    TabularReport { kind, title: title.to_string(), headers, rows, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reports::{InventoryReportRow, PaymentStatEntry, ProductProfitRow, SaleReportRow};
    use crate::models::sales::{PaymentMethod, SaleStatus};
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn transaction(kind: TransactionKind, status: TransactionStatus, cents: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            description: "Lançamento".into(),
            kind,
            value: money(cents),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            payment_date: NaiveDate::from_ymd_opt(2025, 1, 9),
            status,
            sale_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn sales_report_renders_missing_customer_and_total() {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap();
        let report = build_report(ReportData::Sales(vec![
            SaleReportRow {
                number: 1,
                created_at,
                customer_name: None,
                status: SaleStatus::Completed,
                payment_method: PaymentMethod::Pix,
                total: money(10000),
            },
            SaleReportRow {
                number: 2,
                created_at,
                customer_name: Some("Ana".into()),
                status: SaleStatus::Pending,
                payment_method: PaymentMethod::Credit,
                total: money(5050),
            },
        ]));

        assert_eq!(report.kind, ReportKind::Sales);
        assert_eq!(report.headers.len(), 6);
        assert_eq!(
            report.rows[0],
            vec!["1", "15/01/2025 14:30", "Consumidor Final", "Finalizada", "PIX", "R$ 100.00"]
        );
        assert_eq!(report.rows[1][2], "Ana");
        assert_eq!(report.rows[1][4], "Crédito");
        assert_eq!(report.summary["total_vendas"], "R$ 150.50");
    }

    #[test]
    fn inventory_report_values_stock() {
        let report = build_report(ReportData::Inventory(vec![InventoryReportRow {
            name: "Malbec".into(),
            brand_name: None,
            stock_quantity: 3,
            cost_price: money(10000),
            selling_price: money(15000),
        }]));

        assert_eq!(report.rows[0][1], "-");
        assert_eq!(report.rows[0][5], "R$ 300.00");
        assert_eq!(report.summary["custo_total"], "R$ 300.00");
        assert_eq!(report.summary["venda_total"], "R$ 450.00");
        assert_eq!(report.summary["lucro_potencial"], "R$ 150.00");
    }

    #[test]
    fn grouped_reports_use_fallback_names() {
        let groups = || vec![GroupedTotalRow { label: None, quantity: 2, total: money(2000) }];

        assert_eq!(build_report(ReportData::SalesByBrand(groups())).rows[0][0], "Sem Marca");
        assert_eq!(build_report(ReportData::SalesByUser(groups())).rows[0][0], "Sistema");
        assert_eq!(build_report(ReportData::SalesByCustomer(groups())).rows[0][0], "Consumidor Final");

        let payments = build_report(ReportData::SalesByPayment(vec![PaymentStatEntry {
            payment_method: PaymentMethod::Cash,
            total: money(999),
            count: 1,
        }]));
        assert_eq!(payments.rows[0], vec!["Dinheiro", "1", "R$ 9.99"]);
    }

    #[test]
    fn profit_by_product_sorted_by_profit_with_margin() {
        let report = build_report(ReportData::ProfitByProduct(vec![
            ProductProfitRow { name: "Barato".into(), quantity: 1, revenue: money(1000), cost: money(900) },
            ProductProfitRow { name: "Caro".into(), quantity: 2, revenue: money(40000), cost: money(30000) },
        ]));

        assert_eq!(report.rows[0][0], "Caro");
        assert_eq!(report.rows[0][4], "R$ 100.00");
        assert_eq!(report.rows[0][5], "25.0%");
        assert_eq!(report.rows[1][5], "10.0%");
        assert_eq!(report.summary["lucro_total_produtos"], "R$ 101.00");
    }

    #[test]
    fn cash_flow_counts_only_paid_and_signs_expenses() {
        let report = build_report(ReportData::CashFlow(vec![
            transaction(TransactionKind::Income, TransactionStatus::Paid, 10000),
            transaction(TransactionKind::Expense, TransactionStatus::Paid, 3000),
            transaction(TransactionKind::Income, TransactionStatus::Pending, 50000),
        ]));

        assert_eq!(report.rows[1][3], "- R$ 30.00");
        assert_eq!(report.rows[0][0], "09/01/2025");
        assert_eq!(report.summary["saldo_periodo"], "R$ 70.00");
    }

    #[test]
    fn balance_sheet_equity() {
        let report = build_report(ReportData::BalanceSheet(BalanceSheetFigures {
            stock_value: money(100000),
            receivables: money(20000),
            payables: money(30000),
            cash_balance: money(5000),
        }));

        assert_eq!(report.rows.len(), 5);
        assert_eq!(report.rows[4], vec!["Patrimônio Líquido Estimado", "Resultado", "R$ 950.00"]);
        assert_eq!(report.summary["ativo_total"], "R$ 1250.00");
    }

    #[test]
    fn metrics_handle_empty_period() {
        let empty = sales_metrics(Decimal::ZERO, 0, Decimal::ZERO);
        assert_eq!(empty, SalesMetrics::default());

        let m = sales_metrics(money(30000), 3, money(18000));
        assert_eq!(m.avg_ticket, money(10000));
        assert_eq!(m.gross_profit, money(12000));
        assert_eq!(m.profit_margin, money(4000));
    }
}
