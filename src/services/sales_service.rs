// src/services/sales_service.rs
//
// Fluxo de vendas do PDV. Toda operação que mexe em estoque roda numa transação
// e trava a linha da venda antes de decidir o que fazer.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        inventory_repo::NewMovement,
        sales_repo::NewSale,
        CrmRepository, FinanceRepository, InventoryRepository, SalesRepository,
    },
    models::{
        finance::{Transaction, TransactionKind, TransactionPayload, TransactionStatus},
        inventory::{KitComponentDetail, Product, StockMovementReason},
        sales::{
            validate_initial_status, CreateSalePayload, RegisterPaymentPayload, Sale, SaleDetail, SaleItem,
            SaleItemPayload, SaleStatus, SaleSummary, UpdateSaleAdjustmentsPayload,
        },
    },
    services::{
        kit::{self, group_by_kit, plan_item_deductions, SoldProduct},
        pricing::{compute_totals, line_subtotal, SaleAdjustments},
    },
};

// Produtos envolvidos numa venda + componentes dos kits entre eles
struct Catalog {
    products: HashMap<Uuid, Product>,
    components: HashMap<Uuid, Vec<KitComponentDetail>>,
}

impl Catalog {
    fn product(&self, id: Uuid) -> Result<&Product, AppError> {
        self.products
            .get(&id)
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    fn components(&self, kit_id: Uuid) -> &[KitComponentDetail] {
        self.components.get(&kit_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Clone)]
pub struct SalesService {
    sales_repo: SalesRepository,
    inventory_repo: InventoryRepository,
    crm_repo: CrmRepository,
    finance_repo: FinanceRepository,
    commission_rate: Decimal,
}

impl SalesService {
    pub fn new(
        sales_repo: SalesRepository,
        inventory_repo: InventoryRepository,
        crm_repo: CrmRepository,
        finance_repo: FinanceRepository,
        commission_rate: Decimal,
    ) -> Self {
        Self { sales_repo, inventory_repo, crm_repo, finance_repo, commission_rate }
    }

    // =========================================================================
    //  CHECKOUT
    // =========================================================================

    /// Fecha a venda do PDV: cabeçalho, itens (preço do cadastro), totais e estoque.
    /// Pendente reserva o estoque; finalizada baixa direto.
    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        salesperson_id: Option<Uuid>,
        payload: &CreateSalePayload,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.items.is_empty() {
            return Err(AppError::EmptySale);
        }
        if let Err(e) = validate_initial_status(&payload.status) {
            let mut errors = validator::ValidationErrors::new();
            errors.add("status", e);
            return Err(AppError::ValidationError(errors));
        }

        let mut tx = executor.begin().await?;

        // 1. Cliente: cadastrado, avulso pelo nome, ou consumidor final
        let customer_id = match (payload.customer_id, payload.customer_name.as_deref().map(str::trim)) {
            (Some(id), _) => {
                let customer = self
                    .crm_repo
                    .find_customer(&mut *tx, id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Cliente".into()))?;
                Some(customer.id)
            }
            (None, Some(name)) if !name.is_empty() => {
                Some(self.crm_repo.find_or_create_by_name(&mut *tx, name).await?.id)
            }
            _ => None,
        };

        // 2. Cabeçalho
        let sale = self
            .sales_repo
            .insert_sale(
                &mut *tx,
                &NewSale {
                    salesperson_id,
                    customer_id,
                    payment_method: payload.payment_method,
                    installments: payload.installments,
                    discount_value: payload.discount_value,
                    discount_type: payload.discount_type,
                    tax_value: payload.tax_value,
                    tax_type: payload.tax_type,
                    status: payload.status,
                },
            )
            .await?;

        // 3. Itens + estoque
        let product_ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
        let catalog = self.load_catalog(&mut tx, &product_ids).await?;

        let reason = match sale.status {
            SaleStatus::Completed => StockMovementReason::Sale,
            _ => StockMovementReason::SaleReservation,
        };

        for item_payload in &payload.items {
            let item = self.insert_item(&mut tx, &sale, &catalog, item_payload).await?;
            let product = catalog.product(item.product_id)?;
            self.record_item_deductions(&mut tx, &sale, &item, product, catalog.components(product.id), reason)
                .await?;
        }

        // 4. Totais e comissão
        let sale = self.refresh_totals(&mut tx, &sale).await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            number = sale.number,
            status = ?sale.status,
            total = %sale.total,
            items = payload.items.len(),
            "🛒 Venda criada"
        );
        Ok(sale)
    }

    // =========================================================================
    //  CICLO DE VIDA
    // =========================================================================

    /// Pendente -> finalizada. As reservas viram baixa definitiva (sem mexer no
    /// saldo de novo) e o que faltar é baixado agora. Repetir a chamada não faz nada.
    pub async fn finalize_sale<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self.lock_sale(&mut tx, sale_id).await?;

        match sale.status {
            SaleStatus::Completed => {
                tracing::info!(sale_id = %sale.id, "Venda #{} já finalizada; nada a fazer", sale.number);
                tx.commit().await?;
                return Ok(sale);
            }
            SaleStatus::Canceled => {
                return Err(AppError::InvalidSaleTransition { from: sale.status, to: SaleStatus::Completed });
            }
            SaleStatus::Pending => {}
        }

        let converted = self
            .inventory_repo
            .convert_reservations(&mut *tx, sale.id, &kit::sale_note(sale.number))
            .await?;

        // Itens sem reserva (ex.: criados antes do controle de reservas) recebem a baixa aqui
        let items = self.sales_repo.list_items(&mut *tx, sale.id).await?;
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let catalog = self.load_catalog(&mut tx, &product_ids).await?;

        let mut inserted = 0;
        for item in &items {
            let product = catalog.product(item.product_id)?;
            inserted += self
                .record_item_deductions(
                    &mut tx,
                    &sale,
                    item,
                    product,
                    catalog.components(product.id),
                    StockMovementReason::Sale,
                )
                .await?;
        }

        self.refresh_totals(&mut tx, &sale).await?;
        let sale = self.sales_repo.update_status(&mut *tx, sale.id, SaleStatus::Completed).await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            number = sale.number,
            converted_reservations = converted,
            new_deductions = inserted,
            "✅ Venda finalizada"
        );
        Ok(sale)
    }

    /// Pendente ou finalizada -> cancelada, devolvendo ao estoque cada baixa uma única vez.
    pub async fn cancel_sale<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self.lock_sale(&mut tx, sale_id).await?;
        if !sale.status.can_transition_to(SaleStatus::Canceled) {
            return Err(AppError::InvalidSaleTransition { from: sale.status, to: SaleStatus::Canceled });
        }

        let reversed = self
            .inventory_repo
            .reverse_sale_deductions(&mut *tx, sale.id, &kit::cancellation_note(sale.number))
            .await?;
        let sale = self.sales_repo.update_status(&mut *tx, sale.id, SaleStatus::Canceled).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale.id, number = sale.number, reversed, "↩️ Venda cancelada");
        Ok(sale)
    }

    /// Exclui um orçamento (venda pendente), devolvendo as reservas ao estoque.
    pub async fn delete_pending_sale<'e, E>(&self, executor: E, sale_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self.lock_sale(&mut tx, sale_id).await?;
        if sale.status != SaleStatus::Pending {
            return Err(AppError::SaleNotEditable(sale.status));
        }

        let reversed = self
            .inventory_repo
            .reverse_sale_deductions(&mut *tx, sale.id, &kit::pending_cancellation_note(sale.number))
            .await?;
        self.sales_repo.delete_sale(&mut *tx, sale.id).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale.id, number = sale.number, reversed, "🗑️ Orçamento excluído");
        Ok(())
    }

    // =========================================================================
    //  EDIÇÃO DE VENDA PENDENTE
    // =========================================================================

    pub async fn add_item<'e, E>(&self, executor: E, sale_id: Uuid, payload: &SaleItemPayload) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self.lock_sale(&mut tx, sale_id).await?;
        if sale.status != SaleStatus::Pending {
            return Err(AppError::SaleNotEditable(sale.status));
        }

        let catalog = self.load_catalog(&mut tx, &[payload.product_id]).await?;
        let item = self.insert_item(&mut tx, &sale, &catalog, payload).await?;
        let product = catalog.product(item.product_id)?;
        self.record_item_deductions(
            &mut tx,
            &sale,
            &item,
            product,
            catalog.components(product.id),
            StockMovementReason::SaleReservation,
        )
        .await?;

        let sale = self.refresh_totals(&mut tx, &sale).await?;
        tx.commit().await?;

        tracing::info!(sale_id = %sale.id, product_id = %item.product_id, quantity = item.quantity, "➕ Item adicionado à venda");
        Ok(sale)
    }

    pub async fn update_adjustments<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        payload: &UpdateSaleAdjustmentsPayload,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sale = self.lock_sale(&mut tx, sale_id).await?;
        if sale.status != SaleStatus::Pending {
            return Err(AppError::SaleNotEditable(sale.status));
        }

        let sale = self.sales_repo.update_adjustments(&mut *tx, sale.id, payload).await?;
        let sale = self.refresh_totals(&mut tx, &sale).await?;

        tx.commit().await?;
        Ok(sale)
    }

    // =========================================================================
    //  PAGAMENTOS
    // =========================================================================

    /// Registra um pagamento (parcial ou total) como receita paga vinculada à venda.
    pub async fn register_payment<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        payload: &RegisterPaymentPayload,
        today: NaiveDate,
    ) -> Result<Transaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if payload.amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount("O valor do pagamento deve ser maior que zero.".into()));
        }

        let mut tx = executor.begin().await?;

        let sale = self.lock_sale(&mut tx, sale_id).await?;
        if sale.status == SaleStatus::Canceled {
            return Err(AppError::SaleNotEditable(sale.status));
        }

        let transaction = self
            .finance_repo
            .create_transaction(
                &mut *tx,
                &TransactionPayload {
                    description: kit::payment_description(sale.number),
                    kind: TransactionKind::Income,
                    value: payload.amount,
                    due_date: today,
                    payment_date: Some(today),
                    status: TransactionStatus::Paid,
                    sale_id: Some(sale.id),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            amount = %payload.amount,
            method = ?payload.payment_method,
            "💰 Pagamento registrado"
        );
        Ok(transaction)
    }

    // =========================================================================
    //  CONSULTAS
    // =========================================================================

    pub async fn get_sale<'a, A>(&self, conn: A, sale_id: Uuid) -> Result<SaleDetail, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let header = self
            .sales_repo
            .find_sale(&mut *conn, sale_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))?;
        let items = self.sales_repo.list_item_details(&mut *conn, sale_id).await?;
        let extras = self.sales_repo.find_detail_extras(&mut *conn, sale_id).await?;

        let remaining = (header.total - extras.amount_paid).max(Decimal::ZERO);

        Ok(SaleDetail {
            header,
            customer_name: extras.customer_name,
            salesperson_name: extras.salesperson_name,
            items,
            amount_paid: extras.amount_paid,
            remaining,
        })
    }

    pub async fn list_sales<'e, E>(&self, executor: E, status: Option<SaleStatus>) -> Result<Vec<SaleSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.sales_repo.list_sales(executor, status).await
    }

    /// Vendas pendentes com o quanto já foi pago e o saldo restante.
    pub async fn list_pending_sales<'e, E>(&self, executor: E) -> Result<Vec<SaleSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.sales_repo.list_sales(executor, Some(SaleStatus::Pending)).await
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn lock_sale(&self, conn: &mut PgConnection, sale_id: Uuid) -> Result<Sale, AppError> {
        self.sales_repo
            .lock_sale(&mut *conn, sale_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Venda".into()))
    }

    async fn load_catalog(&self, conn: &mut PgConnection, product_ids: &[Uuid]) -> Result<Catalog, AppError> {
        let products: HashMap<Uuid, Product> = self
            .inventory_repo
            .find_products_by_ids(&mut *conn, product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let kit_ids: Vec<Uuid> = products.values().filter(|p| p.is_kit()).map(|p| p.id).collect();
        let components = if kit_ids.is_empty() {
            HashMap::new()
        } else {
            group_by_kit(self.inventory_repo.list_components(&mut *conn, &kit_ids).await?)
        };

        Ok(Catalog { products, components })
    }

    // Preço congelado a partir do cadastro no momento da venda
    async fn insert_item(
        &self,
        conn: &mut PgConnection,
        sale: &Sale,
        catalog: &Catalog,
        payload: &SaleItemPayload,
    ) -> Result<SaleItem, AppError> {
        if payload.quantity < 1 {
            return Err(AppError::InvalidAmount("A quantidade deve ser pelo menos 1.".into()));
        }
        let product = catalog.product(payload.product_id)?;
        let price = product.selling_price;

        self.sales_repo
            .insert_item(
                &mut *conn,
                sale.id,
                product.id,
                payload.quantity,
                price,
                line_subtotal(price, payload.quantity),
            )
            .await
    }

    /// Grava as baixas do item (com expansão de kit). Baixas já existentes para o
    /// mesmo item/produto são ignoradas. Retorna quantas foram gravadas agora.
    async fn record_item_deductions(
        &self,
        conn: &mut PgConnection,
        sale: &Sale,
        item: &SaleItem,
        product: &Product,
        components: &[KitComponentDetail],
        reason: StockMovementReason,
    ) -> Result<usize, AppError> {
        let sold = SoldProduct { id: product.id, name: &product.name, kind: product.kind };
        let deductions = plan_item_deductions(sold, components, item.quantity)?;

        let mut inserted = 0;
        for deduction in deductions {
            let notes = match reason {
                StockMovementReason::SaleReservation => kit::reservation_note(sale.number, deduction.kit_name.as_deref()),
                _ => kit::sale_note(sale.number),
            };

            let applied = self
                .inventory_repo
                .record_stock_movement(
                    &mut *conn,
                    &NewMovement {
                        product_id: deduction.product_id,
                        quantity_changed: -deduction.quantity,
                        reason,
                        notes: Some(notes.as_str()),
                        sale_id: Some(sale.id),
                        sale_item_id: Some(item.id),
                    },
                )
                .await?;

            if let Some(applied) = applied {
                inserted += 1;
                if applied.stock_after < 0 {
                    tracing::warn!(
                        product_id = %deduction.product_id,
                        stock = applied.stock_after,
                        sale = sale.number,
                        "⚠️ Estoque negativo após venda"
                    );
                }
            }
        }
        Ok(inserted)
    }

    async fn refresh_totals(&self, conn: &mut PgConnection, sale: &Sale) -> Result<Sale, AppError> {
        let items = self.sales_repo.list_items(&mut *conn, sale.id).await?;
        let totals = compute_totals(
            items.iter().map(|i| i.subtotal),
            &SaleAdjustments::from(sale),
            self.commission_rate,
        );

        self.sales_repo
            .update_totals(&mut *conn, sale.id, totals.total, totals.commission)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            inventory::{AddKitComponentPayload, CreateProductPayload, KitPayload, ProductKind, ProductPayload},
            sales::{AdjustmentType, PaymentMethod},
        },
        services::{inventory_service::InventoryService, pricing::DEFAULT_COMMISSION_RATE},
    };
    use sqlx::PgPool;

    fn sales_service() -> SalesService {
        SalesService::new(
            SalesRepository::new(),
            InventoryRepository::new(),
            CrmRepository::new(),
            FinanceRepository::new(),
            DEFAULT_COMMISSION_RATE,
        )
    }

    async fn product(pool: &PgPool, name: &str, price: i64, stock: i32) -> Product {
        let payload = CreateProductPayload {
            product: ProductPayload {
                name: name.into(),
                brand_id: None,
                category_id: None,
                supplier_id: None,
                line: String::new(),
                kind: ProductKind::Perfume,
                gender: Default::default(),
                olfactory_family_id: None,
                top_notes: String::new(),
                heart_notes: String::new(),
                base_notes: String::new(),
                description: String::new(),
                volume: "100ml".into(),
                barcode: None,
                batch_code: String::new(),
                expiration_date: None,
                cost_price: Decimal::new(price / 2, 0),
                selling_price: Decimal::new(price, 0),
                min_stock: 0,
                image_url: None,
            },
            initial_stock: stock,
        };
        InventoryService::new(InventoryRepository::new())
            .create_product(pool, &payload)
            .await
            .unwrap()
    }

    async fn kit_with(pool: &PgPool, name: &str, components: &[(Uuid, Decimal)]) -> Product {
        let inventory = InventoryService::new(InventoryRepository::new());
        let kit = inventory
            .create_kit(pool, &KitPayload { name: name.into(), selling_price: Decimal::new(300, 0) })
            .await
            .unwrap();
        for (component_id, quantity) in components {
            inventory
                .add_kit_component(pool, kit.id, &AddKitComponentPayload { component_id: *component_id, quantity: *quantity })
                .await
                .unwrap();
        }
        kit
    }

    fn sale_payload(status: SaleStatus, items: &[(Uuid, i32)]) -> CreateSalePayload {
        CreateSalePayload {
            customer_id: None,
            customer_name: None,
            payment_method: PaymentMethod::Pix,
            installments: 1,
            discount_value: Decimal::ZERO,
            discount_type: AdjustmentType::Fixed,
            tax_value: Decimal::ZERO,
            tax_type: AdjustmentType::Fixed,
            status,
            items: items
                .iter()
                .map(|(product_id, quantity)| SaleItemPayload { product_id: *product_id, quantity: *quantity })
                .collect(),
        }
    }

    async fn stock(pool: &PgPool, id: Uuid) -> i32 {
        sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn movements(pool: &PgPool, sale_id: Uuid, reason: StockMovementReason) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE sale_id = $1 AND reason = $2")
            .bind(sale_id)
            .bind(reason)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn pending_kit_sale_is_finalized_once_and_reversed_once(pool: PgPool) {
        let service = sales_service();
        let a = product(&pool, "Decant Malbec", 50, 20).await;
        let b = product(&pool, "Body Splash", 40, 10).await;
        let combo = kit_with(&pool, "Kit Natal", &[(a.id, Decimal::new(2, 0)), (b.id, Decimal::ONE)]).await;

        // 3 kits + 1 avulso: A -6, B -3 -1
        let sale = service
            .create_sale(&pool, None, &sale_payload(SaleStatus::Pending, &[(combo.id, 3), (b.id, 1)]))
            .await
            .unwrap();
        assert_eq!(sale.status, SaleStatus::Pending);
        assert_eq!(stock(&pool, a.id).await, 14);
        assert_eq!(stock(&pool, b.id).await, 6);
        assert_eq!(stock(&pool, combo.id).await, 0);
        assert_eq!(movements(&pool, sale.id, StockMovementReason::SaleReservation).await, 3);

        // Finalizar converte as reservas sem baixar de novo; a segunda chamada não faz nada
        for _ in 0..2 {
            let finalized = service.finalize_sale(&pool, sale.id).await.unwrap();
            assert_eq!(finalized.status, SaleStatus::Completed);
            assert_eq!(stock(&pool, a.id).await, 14);
            assert_eq!(stock(&pool, b.id).await, 6);
        }
        assert_eq!(movements(&pool, sale.id, StockMovementReason::Sale).await, 3);
        assert_eq!(movements(&pool, sale.id, StockMovementReason::SaleReservation).await, 0);

        let canceled = service.cancel_sale(&pool, sale.id).await.unwrap();
        assert_eq!(canceled.status, SaleStatus::Canceled);
        assert_eq!(stock(&pool, a.id).await, 20);
        assert_eq!(stock(&pool, b.id).await, 10);
        assert_eq!(movements(&pool, sale.id, StockMovementReason::SaleCancellation).await, 3);

        let again = service.cancel_sale(&pool, sale.id).await.unwrap_err();
        assert!(matches!(again, AppError::InvalidSaleTransition { from: SaleStatus::Canceled, .. }));
        assert_eq!(stock(&pool, a.id).await, 20);
        assert_eq!(movements(&pool, sale.id, StockMovementReason::SaleCancellation).await, 3);

        let finalize_canceled = service.finalize_sale(&pool, sale.id).await.unwrap_err();
        assert!(matches!(finalize_canceled, AppError::InvalidSaleTransition { .. }));
    }

    #[sqlx::test]
    async fn completed_sale_deducts_on_creation_with_snapshot_totals(pool: PgPool) {
        let service = sales_service();
        let perfume = product(&pool, "Malbec Gold", 100, 5).await;

        let mut payload = sale_payload(SaleStatus::Completed, &[(perfume.id, 2)]);
        payload.discount_value = Decimal::new(10, 0);
        let sale = service.create_sale(&pool, None, &payload).await.unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.total, Decimal::new(19000, 2));
        assert_eq!(sale.commission, Decimal::new(950, 2));
        assert_eq!(stock(&pool, perfume.id).await, 3);
        assert_eq!(movements(&pool, sale.id, StockMovementReason::Sale).await, 1);

        // Já finalizada: nada muda
        service.finalize_sale(&pool, sale.id).await.unwrap();
        assert_eq!(stock(&pool, perfume.id).await, 3);
        assert_eq!(movements(&pool, sale.id, StockMovementReason::Sale).await, 1);

        let detail = service.get_sale(&pool, sale.id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.remaining, sale.total);
    }

    #[sqlx::test]
    async fn deleting_a_pending_sale_returns_reserved_stock(pool: PgPool) {
        let service = sales_service();
        let perfume = product(&pool, "Malbec Gold", 100, 10).await;

        let pending = service
            .create_sale(&pool, None, &sale_payload(SaleStatus::Pending, &[(perfume.id, 4)]))
            .await
            .unwrap();
        assert_eq!(stock(&pool, perfume.id).await, 6);

        service.delete_pending_sale(&pool, pending.id).await.unwrap();
        assert_eq!(stock(&pool, perfume.id).await, 10);
        assert!(matches!(
            service.get_sale(&pool, pending.id).await.unwrap_err(),
            AppError::ResourceNotFound(_)
        ));

        let completed = service
            .create_sale(&pool, None, &sale_payload(SaleStatus::Completed, &[(perfume.id, 1)]))
            .await
            .unwrap();
        let err = service.delete_pending_sale(&pool, completed.id).await.unwrap_err();
        assert!(matches!(err, AppError::SaleNotEditable(SaleStatus::Completed)));
        assert_eq!(stock(&pool, perfume.id).await, 9);
    }

    #[sqlx::test]
    async fn fractional_kit_quantity_rolls_back_the_whole_sale(pool: PgPool) {
        let service = sales_service();
        let sample = product(&pool, "Amostra", 10, 10).await;
        let perfume = product(&pool, "Malbec Gold", 100, 10).await;
        let samples = kit_with(&pool, "Kit Amostras", &[(sample.id, Decimal::new(5, 1))]).await;

        // 0.5 x 3 = 1.5 unidades
        let err = service
            .create_sale(&pool, None, &sale_payload(SaleStatus::Completed, &[(perfume.id, 1), (samples.id, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FractionalKitQuantity { .. }));

        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales").fetch_one(&pool).await.unwrap();
        assert_eq!(sales, 0);
        assert_eq!(stock(&pool, perfume.id).await, 10);
        assert_eq!(stock(&pool, sample.id).await, 10);
    }
}
