// src/db/pg_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool, Row};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    db::store::TraceStore,
    models::{
        admin::{AdminAction, AlertKey, NewAdminAction, NewSystemAlert, SystemAlert},
        botanical::{CollectionEvent, HerbSpecies, NewCollectionEvent, NewHerbSpecies},
        distribution::{
            DistributorInventory, DistributorShipment, NewInventoryItem, NewShipment,
            NewShipmentItem, ShipmentItem,
        },
        organization::{NewOrganization, NewUser, OrgType, Organization, User},
        production::{
            BatchStatus, FinishedGood, FinishedGoodComposition, NewComposition, NewFinishedGood,
            NewRawMaterialBatch, RawMaterialBatch,
        },
        quality::{Certificate, LabResults, LabTest, NewCertificate, NewLabTest},
        table::Table,
        traceability::{
            Document, LinkedTable, NewDocument, NewQrCode, NewSupplyChainEvent,
            PolymorphicColumns, QrCode, SupplyChainEvent,
        },
    },
};

// O repositório do grafo, responsável por todas as interações com o Postgres.
// As queries são checadas em runtime (query_as, não query_as!) para não
// exigir banco na compilação.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list<T>(&self, sql: &str) -> Result<Vec<T>, AppError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let rows = sqlx::query_as::<_, T>(sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

#[async_trait]
impl TraceStore for PgStore {
    // =========================================================================
    //  ORGANIZAÇÕES E USUÁRIOS
    // =========================================================================

    async fn find_organization_by_type(&self, org_type: OrgType) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE org_type = $1")
            .bind(org_type)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    async fn create_organization(&self, new: &NewOrganization) -> Result<Organization, AppError> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, org_type, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(new.org_type)
        .bind(&new.description)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Organization", &format!("{:?}", new.org_type)))?;
        Ok(org)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, AppError> {
        self.list("SELECT * FROM organizations ORDER BY created_at ASC, id ASC").await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        // INSERT simples: a guarda já checou a existência antes.
        // Se outro processo criou no meio tempo, vira DuplicateKey.
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, role, org_type, organization_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.org_type)
        .bind(new.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "User", &new.email))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.list("SELECT * FROM users ORDER BY created_at ASC, id ASC").await
    }

    // =========================================================================
    //  BOTÂNICA
    // =========================================================================

    async fn find_herb_species(&self, scientific_name: &str) -> Result<Option<HerbSpecies>, AppError> {
        let species = sqlx::query_as::<_, HerbSpecies>(
            "SELECT * FROM herb_species WHERE scientific_name = $1",
        )
        .bind(scientific_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(species)
    }

    async fn upsert_herb_species(&self, new: &NewHerbSpecies) -> Result<(HerbSpecies, bool), AppError> {
        // UPSERT atômico. O UPDATE é um no-op: só existe para o RETURNING
        // devolver a linha que já estava lá. xmax = 0 só numa linha recém-inserida.
        let row = sqlx::query(
            r#"
            INSERT INTO herb_species (common_name, scientific_name, family, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (scientific_name)
            DO UPDATE SET scientific_name = herb_species.scientific_name
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(&new.common_name)
        .bind(&new.scientific_name)
        .bind(&new.family)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
        let species = HerbSpecies::from_row(&row)?;
        let inserted: bool = row.try_get("inserted")?;
        Ok((species, inserted))
    }

    async fn list_herb_species(&self) -> Result<Vec<HerbSpecies>, AppError> {
        self.list("SELECT * FROM herb_species ORDER BY created_at ASC, id ASC").await
    }

    async fn create_collection_event(&self, new: &NewCollectionEvent) -> Result<CollectionEvent, AppError> {
        let event = sqlx::query_as::<_, CollectionEvent>(
            r#"
            INSERT INTO collection_events (
                collector_id, farmer_id, herb_species_id, quantity, unit,
                location, harvest_date, custom_data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.collector_id)
        .bind(new.farmer_id)
        .bind(new.herb_species_id)
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(&new.location)
        .bind(new.harvest_date)
        .bind(&new.custom_data)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn list_collection_events(&self) -> Result<Vec<CollectionEvent>, AppError> {
        self.list("SELECT * FROM collection_events ORDER BY created_at ASC, id ASC").await
    }

    async fn set_collection_event_batch(&self, event_id: Uuid, batch_id: Uuid) -> Result<CollectionEvent, AppError> {
        sqlx::query_as::<_, CollectionEvent>(
            "UPDATE collection_events SET batch_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(event_id)
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound { entity: "CollectionEvent", id: event_id })
    }

    // =========================================================================
    //  PRODUÇÃO
    // =========================================================================

    async fn create_raw_material_batch(&self, new: &NewRawMaterialBatch) -> Result<RawMaterialBatch, AppError> {
        let batch = sqlx::query_as::<_, RawMaterialBatch>(
            r#"
            INSERT INTO raw_material_batches (herb_name, quantity, unit, current_owner_id, supplier_info)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.herb_name)
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(new.current_owner_id)
        .bind(&new.supplier_info)
        .fetch_one(&self.pool)
        .await?;
        Ok(batch)
    }

    async fn find_raw_material_batch(&self, id: Uuid) -> Result<Option<RawMaterialBatch>, AppError> {
        let batch = sqlx::query_as::<_, RawMaterialBatch>("SELECT * FROM raw_material_batches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(batch)
    }

    async fn list_raw_material_batches(&self) -> Result<Vec<RawMaterialBatch>, AppError> {
        self.list("SELECT * FROM raw_material_batches ORDER BY created_at ASC, id ASC").await
    }

    async fn update_batch_status(&self, id: Uuid, status: BatchStatus) -> Result<RawMaterialBatch, AppError> {
        sqlx::query_as::<_, RawMaterialBatch>(
            "UPDATE raw_material_batches SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound { entity: "RawMaterialBatch", id })
    }

    async fn create_finished_good(&self, new: &NewFinishedGood) -> Result<FinishedGood, AppError> {
        sqlx::query_as::<_, FinishedGood>(
            r#"
            INSERT INTO finished_goods (
                product_name, product_type, manufacturer_id, batch_number,
                quantity, unit, manufacture_date, expiry_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new.product_name)
        .bind(&new.product_type)
        .bind(new.manufacturer_id)
        .bind(&new.batch_number)
        .bind(new.quantity)
        .bind(&new.unit)
        .bind(new.manufacture_date)
        .bind(new.expiry_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "FinishedGood", &new.batch_number))
    }

    async fn list_finished_goods(&self) -> Result<Vec<FinishedGood>, AppError> {
        self.list("SELECT * FROM finished_goods ORDER BY created_at ASC, id ASC").await
    }

    async fn create_composition(&self, new: &NewComposition) -> Result<FinishedGoodComposition, AppError> {
        let composition = sqlx::query_as::<_, FinishedGoodComposition>(
            r#"
            INSERT INTO finished_good_compositions (finished_good_id, raw_material_batch_id, percentage, quantity_used)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.finished_good_id)
        .bind(new.raw_material_batch_id)
        .bind(new.percentage)
        .bind(new.quantity_used)
        .fetch_one(&self.pool)
        .await?;
        Ok(composition)
    }

    async fn list_compositions(&self, finished_good_id: Option<Uuid>) -> Result<Vec<FinishedGoodComposition>, AppError> {
        let rows = sqlx::query_as::<_, FinishedGoodComposition>(
            r#"
            SELECT * FROM finished_good_compositions
            WHERE $1::uuid IS NULL OR finished_good_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(finished_good_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    //  QUALIDADE
    // =========================================================================

    async fn create_lab_test(&self, new: &NewLabTest) -> Result<LabTest, AppError> {
        let (batch_id, finished_good_id) = new.subject.columns();
        let test = sqlx::query_as::<_, LabTest>(
            r#"
            INSERT INTO lab_tests (
                test_type, status, requester_id, lab_technician_id,
                batch_id, finished_good_id, results, notes, completion_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&new.test_type)
        .bind(new.status)
        .bind(new.requester_id)
        .bind(new.lab_technician_id)
        .bind(batch_id)
        .bind(finished_good_id)
        .bind(new.results.clone().map(Json))
        .bind(&new.notes)
        .bind(new.completion_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(test)
    }

    async fn find_lab_test(&self, id: Uuid) -> Result<Option<LabTest>, AppError> {
        let test = sqlx::query_as::<_, LabTest>("SELECT * FROM lab_tests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(test)
    }

    async fn list_lab_tests(&self) -> Result<Vec<LabTest>, AppError> {
        self.list("SELECT * FROM lab_tests ORDER BY created_at ASC, id ASC").await
    }

    async fn complete_lab_test(
        &self,
        id: Uuid,
        technician_id: Uuid,
        completed_at: DateTime<Utc>,
        results: &LabResults,
    ) -> Result<LabTest, AppError> {
        sqlx::query_as::<_, LabTest>(
            r#"
            UPDATE lab_tests
            SET status = 'COMPLETED',
                lab_technician_id = $2,
                completion_date = $3,
                results = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(technician_id)
        .bind(completed_at)
        .bind(Json(results))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound { entity: "LabTest", id })
    }

    async fn create_certificate(&self, new: &NewCertificate) -> Result<Certificate, AppError> {
        sqlx::query_as::<_, Certificate>(
            r#"
            INSERT INTO certificates (certificate_number, test_id, issuer_id, organization_id, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&new.certificate_number)
        .bind(new.test_id)
        .bind(new.issuer_id)
        .bind(new.organization_id)
        .bind(new.issued_at)
        .bind(new.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Certificate", &new.certificate_number))
    }

    async fn list_certificates(&self) -> Result<Vec<Certificate>, AppError> {
        self.list("SELECT * FROM certificates ORDER BY created_at ASC, id ASC").await
    }

    // =========================================================================
    //  RASTREABILIDADE
    // =========================================================================

    async fn create_supply_chain_event(&self, new: &NewSupplyChainEvent) -> Result<SupplyChainEvent, AppError> {
        let (batch_id, finished_good_id) = new.subject.columns();
        let event = sqlx::query_as::<_, SupplyChainEvent>(
            r#"
            INSERT INTO supply_chain_events (
                event_type, handler_id, from_location_id, to_location_id,
                raw_material_batch_id, finished_good_id, notes, metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(new.event_type)
        .bind(new.handler_id)
        .bind(new.from_location_id)
        .bind(new.to_location_id)
        .bind(batch_id)
        .bind(finished_good_id)
        .bind(&new.notes)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn list_supply_chain_events(&self) -> Result<Vec<SupplyChainEvent>, AppError> {
        self.list("SELECT * FROM supply_chain_events ORDER BY created_at ASC, id ASC").await
    }

    async fn create_qr_code(&self, new: &NewQrCode) -> Result<QrCode, AppError> {
        sqlx::query_as::<_, QrCode>(
            r#"
            INSERT INTO qr_codes (code, label, svg_data, custom_data)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.code)
        .bind(&new.label)
        .bind(&new.svg_data)
        .bind(&new.custom_data)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "QrCode", &new.code))
    }

    async fn list_qr_codes(&self) -> Result<Vec<QrCode>, AppError> {
        self.list("SELECT * FROM qr_codes ORDER BY created_at ASC, id ASC").await
    }

    async fn create_document(&self, new: &NewDocument) -> Result<Document, AppError> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (title, document_type, file_url, uploaded_by, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new.title)
        .bind(new.document_type)
        .bind(&new.file_url)
        .bind(new.uploaded_by)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(document)
    }

    async fn list_documents(&self) -> Result<Vec<Document>, AppError> {
        self.list("SELECT * FROM documents ORDER BY created_at ASC, id ASC").await
    }

    async fn apply_link(&self, table: LinkedTable, row_id: Uuid, columns: &PolymorphicColumns) -> Result<(), AppError> {
        // Um único UPDATE por linha: tag, id e FKs mudam juntos.
        let result = match table {
            LinkedTable::QrCodes => {
                sqlx::query(
                    r#"
                    UPDATE qr_codes
                    SET entity_type = $2,
                        entity_id = $3,
                        raw_material_batch_id = $4,
                        finished_good_id = $5,
                        lab_test_id = $6,
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(row_id)
                .bind(columns.entity_type)
                .bind(columns.entity_id)
                .bind(columns.raw_material_batch_id)
                .bind(columns.finished_good_id)
                .bind(columns.lab_test_id)
                .execute(&self.pool)
                .await?
            }
            LinkedTable::Documents | LinkedTable::SupplyChainEvents => {
                let (batch_id, finished_good_id) = columns.batch_or_good()?;
                let sql = format!(
                    "UPDATE {} SET raw_material_batch_id = $2, finished_good_id = $3 WHERE id = $1",
                    table.table().as_str()
                );
                sqlx::query(&sql)
                    .bind(row_id)
                    .bind(batch_id)
                    .bind(finished_good_id)
                    .execute(&self.pool)
                    .await?
            }
            LinkedTable::DistributorInventory => {
                let (product_type, entity_id) = columns.product_pointer()?;
                sqlx::query(
                    r#"
                    UPDATE distributor_inventory
                    SET product_type = $2, entity_id = $3, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(row_id)
                .bind(product_type)
                .bind(entity_id)
                .execute(&self.pool)
                .await?
            }
            LinkedTable::SystemAlerts => {
                sqlx::query("UPDATE system_alerts SET entity_type = $2, entity_id = $3 WHERE id = $1")
                    .bind(row_id)
                    .bind(columns.entity_type)
                    .bind(columns.entity_id)
                    .execute(&self.pool)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { entity: table.table().label(), id: row_id });
        }
        Ok(())
    }

    // =========================================================================
    //  DISTRIBUIÇÃO
    // =========================================================================

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> Result<DistributorInventory, AppError> {
        let item = sqlx::query_as::<_, DistributorInventory>(
            r#"
            INSERT INTO distributor_inventory (
                distributor_id, product_type, entity_id, quantity, unit_price,
                warehouse_location, supplier_info
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.distributor_id)
        .bind(new.product_type)
        .bind(new.entity_id)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(&new.warehouse_location)
        .bind(&new.supplier_info)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn list_inventory_items(&self) -> Result<Vec<DistributorInventory>, AppError> {
        self.list("SELECT * FROM distributor_inventory ORDER BY created_at ASC, id ASC").await
    }

    async fn create_shipment(&self, new: &NewShipment) -> Result<DistributorShipment, AppError> {
        sqlx::query_as::<_, DistributorShipment>(
            r#"
            INSERT INTO distributor_shipments (distributor_id, shipment_number, status, destination, shipped_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(new.distributor_id)
        .bind(&new.shipment_number)
        .bind(new.status)
        .bind(&new.destination)
        .bind(new.shipped_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "DistributorShipment", &new.shipment_number))
    }

    async fn list_shipments(&self) -> Result<Vec<DistributorShipment>, AppError> {
        self.list("SELECT * FROM distributor_shipments ORDER BY created_at ASC, id ASC").await
    }

    async fn create_shipment_item(&self, new: &NewShipmentItem) -> Result<ShipmentItem, AppError> {
        let item = sqlx::query_as::<_, ShipmentItem>(
            r#"
            INSERT INTO shipment_items (shipment_id, product_type, entity_id, quantity, unit_price, total_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.shipment_id)
        .bind(new.product_type)
        .bind(new.entity_id)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(new.total_price)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn list_shipment_items(&self) -> Result<Vec<ShipmentItem>, AppError> {
        self.list("SELECT * FROM shipment_items ORDER BY created_at ASC, id ASC").await
    }

    // =========================================================================
    //  ADMINISTRAÇÃO
    // =========================================================================

    async fn create_admin_action(&self, new: &NewAdminAction) -> Result<AdminAction, AppError> {
        let action = sqlx::query_as::<_, AdminAction>(
            r#"
            INSERT INTO admin_actions (action_type, admin_user_id, description, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.action_type)
        .bind(new.admin_user_id)
        .bind(&new.description)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(action)
    }

    async fn list_admin_actions(&self) -> Result<Vec<AdminAction>, AppError> {
        self.list("SELECT * FROM admin_actions ORDER BY created_at ASC, id ASC").await
    }

    async fn find_system_alert(&self, key: &AlertKey) -> Result<Option<SystemAlert>, AppError> {
        let alert = sqlx::query_as::<_, SystemAlert>(
            r#"
            SELECT * FROM system_alerts
            WHERE title = $1 AND alert_type = $2
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(&key.title)
        .bind(key.alert_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(alert)
    }

    async fn create_system_alert(&self, new: &NewSystemAlert) -> Result<SystemAlert, AppError> {
        let alert = sqlx::query_as::<_, SystemAlert>(
            r#"
            INSERT INTO system_alerts (
                title, alert_type, severity, message, entity_type, entity_id,
                is_resolved, resolved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new.title)
        .bind(new.alert_type)
        .bind(new.severity)
        .bind(&new.message)
        .bind(new.target.map(|t| t.kind()))
        .bind(new.target.map(|t| t.id()))
        .bind(new.is_resolved())
        .bind(new.resolved_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "SystemAlert", &new.key().to_string()))?;
        Ok(alert)
    }

    async fn list_system_alerts(&self) -> Result<Vec<SystemAlert>, AppError> {
        self.list("SELECT * FROM system_alerts ORDER BY created_at ASC, id ASC").await
    }

    // =========================================================================
    //  GENÉRICOS
    // =========================================================================
    // Os nomes de tabela vêm do enum fechado `Table`, nunca de entrada externa.

    async fn count(&self, table: Table) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        let total = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn exists(&self, table: Table, id: Uuid) -> Result<bool, AppError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table.as_str());
        let found = sqlx::query_scalar::<_, bool>(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(found)
    }

    async fn list_ids(&self, table: Table) -> Result<Vec<Uuid>, AppError> {
        let sql = format!("SELECT id FROM {} ORDER BY created_at ASC, id ASC", table.as_str());
        let ids = sqlx::query_scalar::<_, Uuid>(&sql).fetch_all(&self.pool).await?;
        Ok(ids)
    }

    async fn delete_all(&self, table: Table) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {}", table.as_str());
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
