// src/services/kit.rs
//
// Planejamento da baixa de estoque de um item de venda.
// Kit com componentes: a baixa vai para cada componente (quantidade x vendida).
// Kit vazio ou produto comum: a baixa é no próprio produto.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::inventory::{KitComponentDetail, ProductKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDeduction {
    pub product_id: Uuid,
    // Sempre positivo; o sinal é aplicado na movimentação
    pub quantity: i32,
    // Preenchido quando a baixa veio da expansão de um kit
    pub kit_name: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SoldProduct<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub kind: ProductKind,
}

pub fn plan_item_deductions(
    product: SoldProduct<'_>,
    components: &[KitComponentDetail],
    sold_quantity: i32,
) -> Result<Vec<StockDeduction>, AppError> {
    if product.kind != ProductKind::Kit || components.is_empty() {
        return Ok(vec![StockDeduction {
            product_id: product.id,
            quantity: sold_quantity,
            kit_name: None,
        }]);
    }

    components
        .iter()
        .map(|component| {
            let needed = component.quantity * Decimal::from(sold_quantity);
            let whole = needed
                .fract()
                .is_zero()
                .then(|| needed.to_i32())
                .flatten()
                .ok_or(AppError::FractionalKitQuantity {
                    kit: product.id,
                    component: component.component_id,
                })?;

            Ok(StockDeduction {
                product_id: component.component_id,
                quantity: whole,
                kit_name: Some(product.name.to_string()),
            })
        })
        .collect()
}

/// Agrupa as linhas de componentes pelo kit a que pertencem.
pub fn group_by_kit(components: Vec<KitComponentDetail>) -> HashMap<Uuid, Vec<KitComponentDetail>> {
    let mut grouped: HashMap<Uuid, Vec<KitComponentDetail>> = HashMap::new();
    for component in components {
        grouped.entry(component.kit_id).or_default().push(component);
    }
    grouped
}

// --- Tipo do produto ---

/// Kit só nasce pelo cadastro de kits (estoque 0, mínimo 0).
pub fn check_new_product_kind(kind: ProductKind) -> Result<(), AppError> {
    if kind == ProductKind::Kit {
        return Err(AppError::InvalidKitComponent(
            "Kits devem ser criados pelo cadastro de kits.".into(),
        ));
    }
    Ok(())
}

/// Um produto comum não vira kit e um kit não deixa de ser kit pela edição genérica.
pub fn check_kind_change(current: ProductKind, requested: ProductKind) -> Result<(), AppError> {
    if current != requested && (current == ProductKind::Kit || requested == ProductKind::Kit) {
        return Err(AppError::InvalidKitComponent(
            "O tipo kit não pode ser alterado na edição do produto.".into(),
        ));
    }
    Ok(())
}

/// "2x Decant Malbec" (quantidades inteiras sem casas decimais).
pub fn component_label(quantity: Decimal, name: &str) -> String {
    format!("{}x {}", quantity.normalize(), name)
}

// --- Observações gravadas nas movimentações ---

pub fn sale_note(number: i64) -> String {
    format!("Venda #{}", number)
}

pub fn reservation_note(number: i64, kit_name: Option<&str>) -> String {
    match kit_name {
        Some(kit) => format!("Venda Kit Pendente #{} ({})", number, kit),
        None => format!("Venda Pendente #{}", number),
    }
}

pub fn cancellation_note(number: i64) -> String {
    format!("Cancelamento Venda #{}", number)
}

pub fn pending_cancellation_note(number: i64) -> String {
    format!("Cancelamento Venda Pendente #{}", number)
}

pub fn payment_description(number: i64) -> String {
    format!("Pagamento Venda #{}", number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(kit_id: Uuid, quantity: Decimal) -> KitComponentDetail {
        KitComponentDetail {
            id: Uuid::new_v4(),
            kit_id,
            component_id: Uuid::new_v4(),
            component_name: "Decant Malbec".into(),
            component_stock: 10,
            quantity,
        }
    }

    #[test]
    fn plain_product_deducts_itself() {
        let id = Uuid::new_v4();
        let product = SoldProduct { id, name: "Malbec", kind: ProductKind::Perfume };

        let plan = plan_item_deductions(product, &[], 3).unwrap();
        assert_eq!(plan, vec![StockDeduction { product_id: id, quantity: 3, kit_name: None }]);
    }

    #[test]
    fn kit_fans_out_to_components() {
        let kit_id = Uuid::new_v4();
        let a = component(kit_id, Decimal::new(2, 0));
        let b = component(kit_id, Decimal::new(100, 2));
        let kit = SoldProduct { id: kit_id, name: "Kit Natal", kind: ProductKind::Kit };

        let plan = plan_item_deductions(kit, &[a.clone(), b.clone()], 3).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].product_id, a.component_id);
        assert_eq!(plan[0].quantity, 6);
        assert_eq!(plan[1].product_id, b.component_id);
        assert_eq!(plan[1].quantity, 3);
        assert!(plan.iter().all(|d| d.kit_name.as_deref() == Some("Kit Natal")));
        assert!(plan.iter().all(|d| d.product_id != kit_id));
    }

    #[test]
    fn empty_kit_deducts_the_kit() {
        let kit_id = Uuid::new_v4();
        let kit = SoldProduct { id: kit_id, name: "Kit Vazio", kind: ProductKind::Kit };

        let plan = plan_item_deductions(kit, &[], 2).unwrap();
        assert_eq!(plan[0].product_id, kit_id);
        assert_eq!(plan[0].quantity, 2);
        assert_eq!(plan[0].kit_name, None);
    }

    #[test]
    fn fractional_component_is_rejected() {
        let kit_id = Uuid::new_v4();
        let half = component(kit_id, Decimal::new(5, 1));
        let kit = SoldProduct { id: kit_id, name: "Kit Amostras", kind: ProductKind::Kit };

        // 0.5 x 2 = 1 unidade: ok
        assert_eq!(plan_item_deductions(kit, &[half.clone()], 2).unwrap()[0].quantity, 1);

        // 0.5 x 3 = 1.5: rejeitado
        let err = plan_item_deductions(kit, &[half.clone()], 3).unwrap_err();
        match err {
            AppError::FractionalKitQuantity { kit, component } => {
                assert_eq!(kit, kit_id);
                assert_eq!(component, half.component_id);
            }
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn kit_kind_is_locked_outside_the_kit_registry() {
        assert!(matches!(check_new_product_kind(ProductKind::Kit), Err(AppError::InvalidKitComponent(_))));
        assert!(check_new_product_kind(ProductKind::Decant).is_ok());

        // Componente não vira kit; kit não vira perfume
        assert!(matches!(
            check_kind_change(ProductKind::Perfume, ProductKind::Kit),
            Err(AppError::InvalidKitComponent(_))
        ));
        assert!(matches!(
            check_kind_change(ProductKind::Kit, ProductKind::Perfume),
            Err(AppError::InvalidKitComponent(_))
        ));

        assert!(check_kind_change(ProductKind::Kit, ProductKind::Kit).is_ok());
        assert!(check_kind_change(ProductKind::Perfume, ProductKind::Decant).is_ok());
    }

    #[test]
    fn labels_and_notes() {
        assert_eq!(component_label(Decimal::new(200, 2), "Decant Malbec"), "2x Decant Malbec");
        assert_eq!(component_label(Decimal::new(50, 2), "Amostra"), "0.5x Amostra");
        assert_eq!(sale_note(12), "Venda #12");
        assert_eq!(reservation_note(7, None), "Venda Pendente #7");
        assert_eq!(reservation_note(7, Some("Kit Natal")), "Venda Kit Pendente #7 (Kit Natal)");
        assert_eq!(cancellation_note(7), "Cancelamento Venda #7");
        assert_eq!(pending_cancellation_note(7), "Cancelamento Venda Pendente #7");
        assert_eq!(payment_description(7), "Pagamento Venda #7");
    }
}
