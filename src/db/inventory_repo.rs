// src/db/inventory_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Executor, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        Brand, Category, KitComponentDetail, OlfactoryFamily, Product, ProductComponent,
        ProductListRow, ProductPayload, StockMovement, StockMovementReason, StockMovementRow, Supplier,
    },
};

// Movimentação gravada + saldo do produto logo após aplicá-la
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMovement {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: StockMovement,
    pub stock_after: i32,
}

// Dados de uma nova movimentação (o sinal de `quantity_changed` define entrada/saída)
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub product_id: Uuid,
    pub quantity_changed: i32,
    pub reason: StockMovementReason,
    pub notes: Option<&'a str>,
    pub sale_id: Option<Uuid>,
    pub sale_item_id: Option<Uuid>,
}

// Tabelas simples de cadastro (id + nome único)
#[derive(Debug, Clone, Copy)]
pub enum NamedTable {
    Categories,
    Brands,
    OlfactoryFamilies,
}

impl NamedTable {
    fn table(self) -> &'static str {
        match self {
            NamedTable::Categories => "categories",
            NamedTable::Brands => "brands",
            NamedTable::OlfactoryFamilies => "olfactory_families",
        }
    }
}

const PRODUCT_LIST_SELECT: &str = r#"
    SELECT p.*, b.name AS brand_name, c.name AS category_name
    FROM products p
    LEFT JOIN brands b ON b.id = p.brand_id
    LEFT JOIN categories c ON c.id = p.category_id
"#;

#[derive(Clone, Default)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Cadastros auxiliares
    // ---

    async fn list_named<'e, E, T>(&self, executor: E, table: NamedTable) -> Result<Vec<T>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = format!("SELECT id, name FROM {} ORDER BY name ASC", table.table());
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(executor).await?;
        Ok(rows)
    }

    async fn create_named<'e, E, T>(&self, executor: E, table: NamedTable, name: &str) -> Result<T, AppError>
    where
        E: Executor<'e, Database = Postgres>,
        T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = format!("INSERT INTO {} (name) VALUES ($1) RETURNING id, name", table.table());
        sqlx::query_as::<_, T>(&sql)
            .bind(name)
            .fetch_one(executor)
            .await
            .map_err(|e| AppError::on_unique_violation(e, |_| AppError::NameAlreadyExists(name.to_string())))
    }

    pub async fn get_all_categories<'e, E>(&self, executor: E) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.list_named(executor, NamedTable::Categories).await
    }

    pub async fn create_category<'e, E>(&self, executor: E, name: &str) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.create_named(executor, NamedTable::Categories, name).await
    }

    pub async fn get_all_brands<'e, E>(&self, executor: E) -> Result<Vec<Brand>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.list_named(executor, NamedTable::Brands).await
    }

    pub async fn create_brand<'e, E>(&self, executor: E, name: &str) -> Result<Brand, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.create_named(executor, NamedTable::Brands, name).await
    }

    pub async fn get_all_olfactory_families<'e, E>(&self, executor: E) -> Result<Vec<OlfactoryFamily>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.list_named(executor, NamedTable::OlfactoryFamilies).await
    }

    pub async fn create_olfactory_family<'e, E>(&self, executor: E, name: &str) -> Result<OlfactoryFamily, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.create_named(executor, NamedTable::OlfactoryFamilies, name).await
    }

    pub async fn get_all_suppliers<'e, E>(&self, executor: E) -> Result<Vec<Supplier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let suppliers = sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers ORDER BY name ASC")
            .fetch_all(executor)
            .await?;
        Ok(suppliers)
    }

    pub async fn create_supplier<'e, E>(
        &self,
        executor: E,
        name: &str,
        document: Option<&str>,
        phone: &str,
        email: &str,
    ) -> Result<Supplier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, document, phone, email)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(document)
        .bind(phone)
        .bind(email)
        .fetch_one(executor)
        .await?;
        Ok(supplier)
    }

    // ---
    // Produtos
    // ---

    pub async fn find_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    // Trava a linha enquanto a edição decide o que pode mudar
    pub async fn find_product_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_products_by_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    pub async fn list_products<'e, E>(&self, executor: E) -> Result<Vec<ProductListRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} ORDER BY p.name ASC", PRODUCT_LIST_SELECT);
        let rows = sqlx::query_as::<_, ProductListRow>(&sql).fetch_all(executor).await?;
        Ok(rows)
    }

    pub async fn find_product_row<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ProductListRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE p.id = $1", PRODUCT_LIST_SELECT);
        let row = sqlx::query_as::<_, ProductListRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Cria o produto com estoque zero; o estoque inicial entra como movimentação.
    pub async fn create_product<'e, E>(&self, executor: E, p: &ProductPayload) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, brand_id, category_id, supplier_id, line, kind, gender,
                olfactory_family_id, top_notes, heart_notes, base_notes, description,
                volume, barcode, batch_code, expiration_date, cost_price, selling_price,
                min_stock, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(&p.name)
        .bind(p.brand_id)
        .bind(p.category_id)
        .bind(p.supplier_id)
        .bind(&p.line)
        .bind(p.kind)
        .bind(p.gender)
        .bind(p.olfactory_family_id)
        .bind(&p.top_notes)
        .bind(&p.heart_notes)
        .bind(&p.base_notes)
        .bind(&p.description)
        .bind(&p.volume)
        .bind(p.barcode.as_deref())
        .bind(&p.batch_code)
        .bind(p.expiration_date)
        .bind(p.cost_price)
        .bind(p.selling_price)
        .bind(p.min_stock)
        .bind(p.image_url.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::on_unique_violation(e, |_| AppError::BarcodeAlreadyExists))
    }

    /// Atualiza o cadastro. `stock_quantity` fica de fora de propósito.
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        p: &ProductPayload,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $2, brand_id = $3, category_id = $4, supplier_id = $5, line = $6,
                kind = $7, gender = $8, olfactory_family_id = $9, top_notes = $10,
                heart_notes = $11, base_notes = $12, description = $13, volume = $14,
                barcode = $15, batch_code = $16, expiration_date = $17, cost_price = $18,
                selling_price = $19, min_stock = $20, image_url = $21, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&p.name)
        .bind(p.brand_id)
        .bind(p.category_id)
        .bind(p.supplier_id)
        .bind(&p.line)
        .bind(p.kind)
        .bind(p.gender)
        .bind(p.olfactory_family_id)
        .bind(&p.top_notes)
        .bind(&p.heart_notes)
        .bind(&p.base_notes)
        .bind(&p.description)
        .bind(&p.volume)
        .bind(p.barcode.as_deref())
        .bind(&p.batch_code)
        .bind(p.expiration_date)
        .bind(p.cost_price)
        .bind(p.selling_price)
        .bind(p.min_stock)
        .bind(p.image_url.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| AppError::on_unique_violation(e, |_| AppError::BarcodeAlreadyExists))
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| AppError::on_foreign_key_violation(e, "Produto"))?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Movimentações de estoque
    // ---

    /// Grava a movimentação e aplica o delta no saldo do produto, na mesma instrução.
    /// Baixas de venda repetidas (mesmo item + produto) são ignoradas: retorna `None`.
    pub async fn record_stock_movement<'e, E>(
        &self,
        executor: E,
        movement: &NewMovement<'_>,
    ) -> Result<Option<AppliedMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let applied = sqlx::query_as::<_, AppliedMovement>(
            r#"
            WITH inserted AS (
                INSERT INTO stock_movements (product_id, quantity_changed, reason, notes, sale_id, sale_item_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT DO NOTHING
                RETURNING *
            ), applied AS (
                UPDATE products p
                SET stock_quantity = p.stock_quantity + i.quantity_changed, updated_at = NOW()
                FROM inserted i
                WHERE p.id = i.product_id
                RETURNING p.stock_quantity
            )
            SELECT i.*, (SELECT stock_quantity FROM applied) AS stock_after
            FROM inserted i
            "#,
        )
        .bind(movement.product_id)
        .bind(movement.quantity_changed)
        .bind(movement.reason)
        .bind(movement.notes)
        .bind(movement.sale_id)
        .bind(movement.sale_item_id)
        .fetch_optional(executor)
        .await?;

        Ok(applied)
    }

    /// Reservas da venda viram baixa definitiva sem mexer no saldo de novo.
    pub async fn convert_reservations<'e, E>(&self, executor: E, sale_id: Uuid, notes: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE stock_movements
            SET reason = 'SALE', notes = $2
            WHERE sale_id = $1 AND reason = 'SALE_RESERVATION'
            "#,
        )
        .bind(sale_id)
        .bind(notes)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Estorna cada baixa (reserva ou saída) da venda uma única vez e devolve o saldo.
    /// Retorna quantas movimentações de estorno foram criadas.
    pub async fn reverse_sale_deductions<'e, E>(&self, executor: E, sale_id: Uuid, notes: &str) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reversed: i64 = sqlx::query_scalar(
            r#"
            WITH reversed AS (
                INSERT INTO stock_movements (product_id, quantity_changed, reason, notes, sale_id, sale_item_id)
                SELECT m.product_id, -m.quantity_changed, 'SALE_CANCELLATION', $2, m.sale_id, m.sale_item_id
                FROM stock_movements m
                WHERE m.sale_id = $1 AND m.reason IN ('SALE', 'SALE_RESERVATION')
                ON CONFLICT DO NOTHING
                RETURNING product_id, quantity_changed
            ), totals AS (
                -- O mesmo produto pode aparecer em mais de um item
                SELECT product_id, SUM(quantity_changed)::INTEGER AS delta
                FROM reversed
                GROUP BY product_id
            ), applied AS (
                UPDATE products p
                SET stock_quantity = p.stock_quantity + t.delta, updated_at = NOW()
                FROM totals t
                WHERE p.id = t.product_id
                RETURNING p.id
            )
            SELECT COUNT(*) FROM reversed
            "#,
        )
        .bind(sale_id)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(reversed)
    }

    pub async fn list_recent_movements<'e, E>(&self, executor: E, limit: i64) -> Result<Vec<StockMovementRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, StockMovementRow>(
            r#"
            SELECT m.*, p.name AS product_name
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            ORDER BY m.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn list_low_stock<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock_quantity <= min_stock ORDER BY stock_quantity ASC, name ASC",
        )
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    /// Produtos vencidos ou que vencem até `until`.
    pub async fn list_expiring<'e, E>(&self, executor: E, until: NaiveDate) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE expiration_date <= $1 ORDER BY expiration_date ASC",
        )
        .bind(until)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    // ---
    // Kits
    // ---

    pub async fn create_kit<'e, E>(&self, executor: E, name: &str, selling_price: Decimal) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Estoque virtual: o saldo real está nos componentes
        let kit = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, selling_price, kind, stock_quantity, min_stock)
            VALUES ($1, $2, 'KIT', 0, 0)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(selling_price)
        .fetch_one(executor)
        .await?;
        Ok(kit)
    }

    pub async fn update_kit<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        selling_price: Decimal,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kit = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET name = $2, selling_price = $3, updated_at = NOW()
            WHERE id = $1 AND kind = 'KIT'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(selling_price)
        .fetch_optional(executor)
        .await?;
        Ok(kit)
    }

    pub async fn delete_kit<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND kind = 'KIT'")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| AppError::on_foreign_key_violation(e, "Kit"))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_kits<'e, E>(&self, executor: E) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let kits = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE kind = 'KIT' ORDER BY name ASC")
            .fetch_all(executor)
            .await?;
        Ok(kits)
    }

    /// Componentes (com nome e saldo) de um ou mais kits.
    pub async fn list_components<'e, E>(&self, executor: E, kit_ids: &[Uuid]) -> Result<Vec<KitComponentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let components = sqlx::query_as::<_, KitComponentDetail>(
            r#"
            SELECT pc.id, pc.kit_id, pc.component_id,
                   p.name AS component_name, p.stock_quantity AS component_stock, pc.quantity
            FROM product_components pc
            JOIN products p ON p.id = pc.component_id
            WHERE pc.kit_id = ANY($1)
            ORDER BY p.name ASC
            "#,
        )
        .bind(kit_ids)
        .fetch_all(executor)
        .await?;
        Ok(components)
    }

    /// Get-or-create: se o componente já está no kit, mantém a quantidade atual.
    pub async fn add_component<'e, E>(
        &self,
        executor: E,
        kit_id: Uuid,
        component_id: Uuid,
        quantity: Decimal,
    ) -> Result<ProductComponent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let component = sqlx::query_as::<_, ProductComponent>(
            r#"
            INSERT INTO product_components (kit_id, component_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (kit_id, component_id)
            DO UPDATE SET quantity = product_components.quantity
            RETURNING *
            "#,
        )
        .bind(kit_id)
        .bind(component_id)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(component)
    }

    pub async fn remove_component<'e, E>(&self, executor: E, kit_id: Uuid, component_row_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM product_components WHERE id = $1 AND kit_id = $2")
            .bind(component_row_id)
            .bind(kit_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
