// src/services/inventory_service.rs

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{documents::normalize_optional, error::AppError, text},
    db::{
        inventory_repo::{AppliedMovement, NewMovement},
        InventoryRepository,
    },
    models::inventory::{
        AddKitComponentPayload, Brand, Category, CreateProductPayload, CreateSupplierPayload,
        KitPayload, KitWithComponents, OlfactoryFamily, PosProduct, Product, ProductComponent, ProductListRow,
        ProductPayload, StockMovementPayload, StockMovementReason, StockOverview, Supplier, EXPIRING_SOON_DAYS,
    },
    services::kit::{check_kind_change, check_new_product_kind, component_label, group_by_kit},
};

pub const RECENT_MOVEMENTS_LIMIT: i64 = 50;
pub const POS_SEARCH_LIMIT: usize = 20;

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository) -> Self {
        Self { inventory_repo }
    }

    // ---
    // Cadastros auxiliares
    // ---

    pub async fn list_categories<'e, E>(&self, executor: E) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.get_all_categories(executor).await
    }

    pub async fn create_category<'e, E>(&self, executor: E, name: &str) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.create_category(executor, name.trim()).await
    }

    pub async fn list_brands<'e, E>(&self, executor: E) -> Result<Vec<Brand>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.get_all_brands(executor).await
    }

    pub async fn create_brand<'e, E>(&self, executor: E, name: &str) -> Result<Brand, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.create_brand(executor, name.trim()).await
    }

    pub async fn list_olfactory_families<'e, E>(&self, executor: E) -> Result<Vec<OlfactoryFamily>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.get_all_olfactory_families(executor).await
    }

    pub async fn create_olfactory_family<'e, E>(&self, executor: E, name: &str) -> Result<OlfactoryFamily, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.create_olfactory_family(executor, name.trim()).await
    }

    pub async fn list_suppliers<'e, E>(&self, executor: E) -> Result<Vec<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo.get_all_suppliers(executor).await
    }

    pub async fn create_supplier<'e, E>(&self, executor: E, payload: &CreateSupplierPayload) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Documento opcional, mas se vier precisa ser CPF/CNPJ válido
        let document = normalize_optional(payload.document.as_deref())?;

        self.inventory_repo
            .create_supplier(
                executor,
                payload.name.trim(),
                document.as_deref(),
                payload.phone.trim(),
                payload.email.as_deref().unwrap_or_default(),
            )
            .await
    }

    // ---
    // Produtos
    // ---

    pub async fn create_product<'e, E>(&self, executor: E, payload: &CreateProductPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        check_new_product_kind(payload.product.kind)?;

        let mut tx = executor.begin().await?;

        let mut product = self
            .inventory_repo
            .create_product(&mut *tx, &clean_product(&payload.product))
            .await?;

        if payload.initial_stock > 0 {
            let applied = self
                .inventory_repo
                .record_stock_movement(
                    &mut *tx,
                    &NewMovement {
                        product_id: product.id,
                        quantity_changed: payload.initial_stock,
                        reason: StockMovementReason::InitialStock,
                        notes: Some("Estoque inicial"),
                        sale_id: None,
                        sale_item_id: None,
                    },
                )
                .await?;

            if let Some(applied) = applied {
                product.stock_quantity = applied.stock_after;
            }
        }

        tx.commit().await?;

        tracing::info!(product_id = %product.id, stock = product.stock_quantity, "📦 Produto cadastrado: {}", product.name);
        Ok(product)
    }

    pub async fn get_product<'e, E>(&self, executor: E, id: Uuid, today: NaiveDate) -> Result<ProductListRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .find_product_row(executor, id)
            .await?
            .map(|row| with_derived_fields(row, today))
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))
    }

    /// Lista (ou busca) os produtos em ordem alfabética. A busca ignora acentos e
    /// caixa e olha nome, código de barras e marca.
    pub async fn list_products<'e, E>(
        &self,
        executor: E,
        query: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<ProductListRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query_norm = text::normalize(query.unwrap_or_default().trim());

        let rows = self.inventory_repo.list_products(executor).await?;

        Ok(rows
            .into_iter()
            .filter(|row| {
                text::matches_any(
                    &query_norm,
                    &[Some(row.product.name.as_str()), row.product.barcode.as_deref(), row.brand_name.as_deref()],
                )
            })
            .map(|row| with_derived_fields(row, today))
            .collect())
    }

    /// Atualiza o cadastro. Entrar ou sair do tipo kit só pelo cadastro de kits.
    pub async fn update_product<'e, E>(&self, executor: E, id: Uuid, payload: &ProductPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let current = self
            .inventory_repo
            .find_product_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;
        check_kind_change(current.kind, payload.kind)?;

        let product = self
            .inventory_repo
            .update_product(&mut *tx, id, &clean_product(payload))
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;

        tx.commit().await?;
        Ok(product)
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.inventory_repo.delete_product(executor, id).await? {
            return Err(AppError::ResourceNotFound("Produto".into()));
        }
        Ok(())
    }

    /// Busca do PDV: até 20 produtos, kits já com a lista de componentes.
    pub async fn pos_search<'a, A>(&self, conn: A, query: &str) -> Result<Vec<PosProduct>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let query_norm = text::normalize(query.trim());

        let matches: Vec<ProductListRow> = self
            .inventory_repo
            .list_products(&mut *conn)
            .await?
            .into_iter()
            .filter(|row| {
                text::matches_any(&query_norm, &[Some(row.product.name.as_str()), row.product.barcode.as_deref()])
            })
            .take(POS_SEARCH_LIMIT)
            .collect();

        let kit_ids: Vec<Uuid> = matches.iter().filter(|r| r.product.is_kit()).map(|r| r.product.id).collect();
        let mut components = if kit_ids.is_empty() {
            HashMap::new()
        } else {
            group_by_kit(self.inventory_repo.list_components(&mut *conn, &kit_ids).await?)
        };

        Ok(matches
            .into_iter()
            .map(|row| {
                let p = row.product;
                let labels = components
                    .remove(&p.id)
                    .unwrap_or_default()
                    .iter()
                    .map(|c| component_label(c.quantity, &c.component_name))
                    .collect();
                PosProduct {
                    id: p.id,
                    is_kit: p.is_kit(),
                    name: p.name,
                    barcode: p.barcode,
                    selling_price: p.selling_price,
                    stock_quantity: p.stock_quantity,
                    components: labels,
                }
            })
            .collect())
    }

    // ---
    // Estoque
    // ---

    /// Entrada/saída manual, aplicada no saldo na mesma transação.
    pub async fn record_manual_movement<'e, E>(
        &self,
        executor: E,
        payload: &StockMovementPayload,
    ) -> Result<AppliedMovement, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let product = self
            .inventory_repo
            .find_product(&mut *tx, payload.product_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Produto".into()))?;

        let applied = self
            .inventory_repo
            .record_stock_movement(
                &mut *tx,
                &NewMovement {
                    product_id: product.id,
                    quantity_changed: payload.signed_quantity(),
                    reason: payload.reason,
                    notes: payload.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
                    sale_id: None,
                    sale_item_id: None,
                },
            )
            .await?
            // Movimentação manual não tem vínculo com venda: nunca conflita
            .ok_or_else(|| anyhow::anyhow!("Movimentação manual ignorada para o produto {}", product.id))?;

        tx.commit().await?;

        if applied.stock_after < 0 {
            tracing::warn!(product_id = %product.id, stock = applied.stock_after, "⚠️ Estoque negativo após movimentação manual");
        }
        tracing::info!(
            product_id = %product.id,
            delta = applied.movement.quantity_changed,
            reason = ?applied.movement.reason,
            "🔄 Movimentação de estoque registrada"
        );

        Ok(applied)
    }

    pub async fn stock_overview<'a, A>(&self, conn: A, today: NaiveDate) -> Result<StockOverview, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let recent_movements = self
            .inventory_repo
            .list_recent_movements(&mut *conn, RECENT_MOVEMENTS_LIMIT)
            .await?;
        let low_stock = self.inventory_repo.list_low_stock(&mut *conn).await?;
        let expiring = self
            .inventory_repo
            .list_expiring(&mut *conn, today + Duration::days(EXPIRING_SOON_DAYS))
            .await?;

        Ok(StockOverview { recent_movements, low_stock, expiring })
    }

    // ---
    // Kits
    // ---

    pub async fn create_kit<'e, E>(&self, executor: E, payload: &KitPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kit = self
            .inventory_repo
            .create_kit(executor, payload.name.trim(), payload.selling_price)
            .await?;
        tracing::info!(kit_id = %kit.id, "🎁 Kit criado: {}", kit.name);
        Ok(kit)
    }

    pub async fn update_kit<'e, E>(&self, executor: E, id: Uuid, payload: &KitPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.inventory_repo
            .update_kit(executor, id, payload.name.trim(), payload.selling_price)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Kit".into()))
    }

    pub async fn delete_kit<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.inventory_repo.delete_kit(executor, id).await? {
            return Err(AppError::ResourceNotFound("Kit".into()));
        }
        Ok(())
    }

    pub async fn list_kits<'a, A>(&self, conn: A) -> Result<Vec<KitWithComponents>, AppError>
    where
        A: Acquire<'a, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        let kits = self.inventory_repo.list_kits(&mut *conn).await?;
        if kits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = kits.iter().map(|k| k.id).collect();
        let mut components = group_by_kit(self.inventory_repo.list_components(&mut *conn, &ids).await?);

        Ok(kits
            .into_iter()
            .map(|kit| KitWithComponents { components: components.remove(&kit.id).unwrap_or_default(), kit })
            .collect())
    }

    /// Adiciona um componente ao kit. Se já estiver no kit, devolve o existente.
    pub async fn add_kit_component<'e, E>(
        &self,
        executor: E,
        kit_id: Uuid,
        payload: &AddKitComponentPayload,
    ) -> Result<ProductComponent, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let kit = self
            .inventory_repo
            .find_product(&mut *tx, kit_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Kit".into()))?;
        if !kit.is_kit() {
            return Err(AppError::NotAKit(kit.id));
        }

        if payload.component_id == kit.id {
            return Err(AppError::InvalidKitComponent("Um kit não pode conter a si mesmo.".into()));
        }

        let component = self
            .inventory_repo
            .find_product(&mut *tx, payload.component_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Componente".into()))?;
        if component.is_kit() {
            return Err(AppError::InvalidKitComponent("Um kit não pode ser componente de outro kit.".into()));
        }

        let entry = self
            .inventory_repo
            .add_component(&mut *tx, kit.id, component.id, payload.quantity)
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    pub async fn remove_kit_component<'e, E>(&self, executor: E, kit_id: Uuid, component_row_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.inventory_repo.remove_component(executor, kit_id, component_row_id).await? {
            return Err(AppError::ResourceNotFound("Componente".into()));
        }
        Ok(())
    }
}

// Nome aparado e código de barras vazio tratado como ausente (a coluna é UNIQUE)
fn clean_product(payload: &ProductPayload) -> ProductPayload {
    let mut p = payload.clone();
    p.name = p.name.trim().to_string();
    p.barcode = p.barcode.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
    p.image_url = p.image_url.filter(|u| !u.trim().is_empty());
    p
}

fn with_derived_fields(mut row: ProductListRow, today: NaiveDate) -> ProductListRow {
    row.profit_margin = row.product.profit_margin();
    row.validity_status = Some(row.product.validity_status(today));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::KitComponentDetail;
    use rust_decimal::Decimal;

    fn payload(barcode: Option<&str>) -> ProductPayload {
        ProductPayload {
            name: "  Malbec Gold ".into(),
            brand_id: None,
            category_id: None,
            supplier_id: None,
            line: String::new(),
            kind: Default::default(),
            gender: Default::default(),
            olfactory_family_id: None,
            top_notes: String::new(),
            heart_notes: String::new(),
            base_notes: String::new(),
            description: String::new(),
            volume: "100ml".into(),
            barcode: barcode.map(str::to_string),
            batch_code: String::new(),
            expiration_date: None,
            cost_price: Decimal::new(10000, 2),
            selling_price: Decimal::new(18990, 2),
            min_stock: 5,
            image_url: Some(" ".into()),
        }
    }

    #[test]
    fn clean_product_trims_and_drops_blank_barcode() {
        let cleaned = clean_product(&payload(Some("   ")));
        assert_eq!(cleaned.name, "Malbec Gold");
        assert_eq!(cleaned.barcode, None);
        assert_eq!(cleaned.image_url, None);

        let cleaned = clean_product(&payload(Some(" 7891234 ")));
        assert_eq!(cleaned.barcode.as_deref(), Some("7891234"));
    }

    #[test]
    fn components_are_grouped_per_kit() {
        let kit_a = Uuid::new_v4();
        let kit_b = Uuid::new_v4();
        let component = |kit_id| KitComponentDetail {
            id: Uuid::new_v4(),
            kit_id,
            component_id: Uuid::new_v4(),
            component_name: "Decant".into(),
            component_stock: 3,
            quantity: Decimal::ONE,
        };

        let grouped = group_by_kit(vec![component(kit_a), component(kit_b), component(kit_a)]);
        assert_eq!(grouped[&kit_a].len(), 2);
        assert_eq!(grouped[&kit_b].len(), 1);
    }

    #[sqlx::test]
    async fn product_edit_cannot_move_into_or_out_of_kit(pool: sqlx::PgPool) {
        use crate::models::inventory::ProductKind;

        let service = InventoryService::new(InventoryRepository::new());

        let mut as_kit = payload(None);
        as_kit.kind = ProductKind::Kit;
        let err = service
            .create_product(&pool, &CreateProductPayload { product: as_kit.clone(), initial_stock: 3 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidKitComponent(_)));

        let component = service
            .create_product(&pool, &CreateProductPayload { product: payload(None), initial_stock: 20 })
            .await
            .unwrap();
        let kit = service
            .create_kit(&pool, &KitPayload { name: "Kit X".into(), selling_price: Decimal::new(200, 0) })
            .await
            .unwrap();
        service
            .add_kit_component(&pool, kit.id, &AddKitComponentPayload { component_id: component.id, quantity: Decimal::ONE })
            .await
            .unwrap();

        // Componente não vira kit
        let err = service.update_product(&pool, component.id, &as_kit).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidKitComponent(_)));

        // Kit não vira perfume pela edição genérica
        let mut kit_as_perfume = payload(None);
        kit_as_perfume.name = "Kit X".into();
        let err = service.update_product(&pool, kit.id, &kit_as_perfume).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidKitComponent(_)));

        let stored = InventoryRepository::new().find_product(&pool, kit.id).await.unwrap().unwrap();
        assert_eq!(stored.kind, ProductKind::Kit);

        // Editar sem trocar o tipo continua valendo
        let mut renamed = payload(None);
        renamed.name = "Malbec Gold Intense".into();
        let updated = service.update_product(&pool, component.id, &renamed).await.unwrap();
        assert_eq!(updated.name, "Malbec Gold Intense");
        assert_eq!(updated.stock_quantity, 20);
    }
}
