// src/services/pairing.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    botanical::CollectionEvent,
    production::RawMaterialBatch,
    traceability::{Document, QrCode, SupplyChainEvent},
};

/// Qualquer linha que saiba dizer quando foi criada.
/// O id desempata linhas criadas no mesmo instante.
pub trait Chronological {
    fn created_at(&self) -> DateTime<Utc>;
    fn id(&self) -> Uuid;

    fn creation_key(&self) -> (DateTime<Utc>, Uuid) {
        (self.created_at(), self.id())
    }
}

macro_rules! chronological {
    ($($row:ty),* $(,)?) => {
        $(
            impl Chronological for $row {
                fn created_at(&self) -> DateTime<Utc> {
                    self.created_at
                }
                fn id(&self) -> Uuid {
                    self.id
                }
            }
        )*
    };
}

chronological!(CollectionEvent, RawMaterialBatch, QrCode, Document, SupplyChainEvent);

/// Pareia por ordem crescente de criação e trunca na lista menor.
///
/// Com N à esquerda e M à direita saem exatamente `min(N, M)` pares;
/// o que sobra fica sem par, e isso não é erro.
pub fn pair_by_creation_order<'a, L, R>(left: &'a [L], right: &'a [R]) -> Vec<(&'a L, &'a R)>
where
    L: Chronological,
    R: Chronological,
{
    let mut left: Vec<&L> = left.iter().collect();
    let mut right: Vec<&R> = right.iter().collect();
    left.sort_by_key(|row| row.creation_key());
    right.sort_by_key(|row| row.creation_key());

    left.into_iter().zip(right).collect()
}

/// Mesma política quando o lado direito é uma lista de posições
/// (ex: a política de vinculação), que já está na ordem desejada.
pub fn pair_with_plan<'a, L, P>(rows: &'a [L], plan: &'a [P]) -> Vec<(&'a L, &'a P)>
where
    L: Chronological,
{
    let mut rows: Vec<&L> = rows.iter().collect();
    rows.sort_by_key(|row| row.creation_key());

    rows.into_iter().zip(plan.iter()).collect()
}
