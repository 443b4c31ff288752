//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! record store and user store ports from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use care_directory_core::domain::{
    Cabinet, CabinetRef, Doctor, NewCabinet, NewDoctor, NewPharmacy, NewUser, Pharmacy, Schedule,
    User, UserCredentials,
};
use care_directory_core::filter::{CabinetFilter, DoctorFilter, PharmacyFilter};
use care_directory_core::page::{
    CabinetSort, DoctorSort, Page, PageRequest, PharmacySort, SortDirection,
};
use care_directory_core::ports::{
    CabinetStore, DoctorStore, PharmacyStore, PortError, PortResult, UserStore,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter implementing every store port on one connection pool.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a driver error onto the port taxonomy. `what` names the record for
/// not-found and conflict messages.
fn store_err(what: &str) -> impl Fn(sqlx::Error) -> PortError + '_ {
    move |e| match &e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} already exists", what))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            PortError::NotFound(format!("{} refers to a missing record", what))
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Parses an enum label read back from a column. A label the domain no
/// longer knows is a data problem, not caller input.
fn stored<T: FromStr<Err = PortError>>(column: &str, raw: &str) -> PortResult<T> {
    raw.parse::<T>()
        .map_err(|_| PortError::Unexpected(format!("unreadable {} '{}' in store", column, raw)))
}

//=========================================================================================
// Dynamic Filtering, Ordering and Paging
//=========================================================================================

/// One ANDed predicate of a filtered query.
#[derive(Debug, Clone, PartialEq)]
enum Condition {
    /// Case-insensitive substring; `%` and `_` are literal.
    NameContains(&'static str, String),
    TextEquals(&'static str, String),
    BoolEquals(&'static str, bool),
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition]) {
    for (i, condition) in conditions.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match condition {
            Condition::NameContains(column, needle) => {
                qb.push("POSITION(LOWER(")
                    .push_bind(needle.clone())
                    .push(format!(") IN LOWER({})) > 0", column));
            }
            Condition::TextEquals(column, value) => {
                qb.push(format!("{} = ", column)).push_bind(value.clone());
            }
            Condition::BoolEquals(column, value) => {
                qb.push(format!("{} = ", column)).push_bind(*value);
            }
        }
    }
}

fn pharmacy_conditions(filter: &PharmacyFilter) -> Vec<Condition> {
    let mut conditions = Vec::new();
    if let Some(name) = &filter.name {
        conditions.push(Condition::NameContains("name", name.clone()));
    }
    if let Some(region) = filter.region {
        conditions.push(Condition::TextEquals("region", region.as_str().to_string()));
    }
    if let Some(district) = filter.district {
        conditions.push(Condition::TextEquals("district", district.as_str().to_string()));
    }
    if let Some(open) = filter.open_tonight {
        conditions.push(Condition::BoolEquals("open_tonight", open));
    }
    conditions
}

fn cabinet_conditions(filter: &CabinetFilter) -> Vec<Condition> {
    let mut conditions = Vec::new();
    if let Some(name) = &filter.name {
        conditions.push(Condition::NameContains("name", name.clone()));
    }
    if let Some(region) = filter.region {
        conditions.push(Condition::TextEquals("region", region.as_str().to_string()));
    }
    if let Some(district) = filter.district {
        conditions.push(Condition::TextEquals("district", district.as_str().to_string()));
    }
    conditions
}

fn doctor_conditions(filter: &DoctorFilter) -> Vec<Condition> {
    let mut conditions = Vec::new();
    if let Some(name) = &filter.name {
        conditions.push(Condition::NameContains("d.name", name.clone()));
    }
    if let Some(speciality) = filter.speciality {
        conditions.push(Condition::TextEquals("d.speciality", speciality.as_str().to_string()));
    }
    conditions
}

fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    }
}

fn pharmacy_order(page: &PageRequest<PharmacySort>) -> String {
    let column = match page.sort {
        PharmacySort::Id => "id",
        PharmacySort::Name => "name",
        PharmacySort::Region => "region",
        PharmacySort::District => "district",
        PharmacySort::OpenTonight => "open_tonight",
    };
    format!("{} {}, id ASC", column, direction_sql(page.direction))
}

fn cabinet_order(page: &PageRequest<CabinetSort>) -> String {
    let column = match page.sort {
        CabinetSort::Id => "id",
        CabinetSort::Name => "name",
        CabinetSort::Region => "region",
        CabinetSort::District => "district",
    };
    format!("{} {}, id ASC", column, direction_sql(page.direction))
}

fn doctor_order(page: &PageRequest<DoctorSort>) -> String {
    let column = match page.sort {
        DoctorSort::Id => "d.id",
        DoctorSort::Name => "d.name",
        DoctorSort::Speciality => "d.speciality",
    };
    format!("{} {}, d.id ASC", column, direction_sql(page.direction))
}

/// The pieces of one filtered, ordered page query.
struct PageQuery<'a> {
    columns: &'a str,
    from: &'a str,
    conditions: Vec<Condition>,
    order_by: String,
    limit: u32,
    offset: u64,
}

impl DbAdapter {
    /// Runs the count and the page query in one REPEATABLE READ transaction so
    /// the total always describes the snapshot the rows came from.
    async fn fetch_page<R>(&self, query: PageQuery<'_>) -> PortResult<(Vec<R>, u64)>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", query.from));
        push_where(&mut count, &query.conditions);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        let mut rows = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {}",
            query.columns, query.from
        ));
        push_where(&mut rows, &query.conditions);
        rows.push(format!(" ORDER BY {}", query.order_by))
            .push(" LIMIT ")
            .push_bind(i64::from(query.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset).unwrap_or(i64::MAX));
        let records: Vec<R> = rows
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        debug!(
            "Fetched {} of {} rows from {}",
            records.len(),
            total,
            query.from
        );
        Ok((records, total.max(0) as u64))
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const PHARMACY_COLUMNS: &str =
    "id, name, longitude, latitude, region, district, image, open_tonight";

#[derive(FromRow)]
struct PharmacyRecord {
    id: i64,
    name: String,
    longitude: f64,
    latitude: f64,
    region: String,
    district: String,
    image: Option<String>,
    open_tonight: bool,
}

impl PharmacyRecord {
    fn into_domain(self) -> PortResult<Pharmacy> {
        Ok(Pharmacy {
            id: self.id,
            region: stored("region", &self.region)?,
            district: stored("district", &self.district)?,
            name: self.name,
            longitude: self.longitude,
            latitude: self.latitude,
            image: self.image,
            open_tonight: self.open_tonight,
            distance_km: None,
        })
    }
}

const CABINET_COLUMNS: &str = "id, name, region, district, longitude, latitude";

#[derive(FromRow)]
struct CabinetRecord {
    id: i64,
    name: String,
    region: String,
    district: String,
    longitude: f64,
    latitude: f64,
}

impl CabinetRecord {
    fn into_domain(self) -> PortResult<Cabinet> {
        Ok(Cabinet {
            id: self.id,
            region: stored("region", &self.region)?,
            district: stored("district", &self.district)?,
            name: self.name,
            longitude: self.longitude,
            latitude: self.latitude,
        })
    }
}

const DOCTOR_COLUMNS: &str = "d.id, d.name, d.speciality, d.cabinet_id, \
     c.name AS cabinet_name, c.longitude AS cabinet_longitude, c.latitude AS cabinet_latitude";
const DOCTOR_FROM: &str = "doctors d JOIN cabinets c ON c.id = d.cabinet_id";

#[derive(FromRow)]
struct DoctorRecord {
    id: i64,
    name: String,
    speciality: String,
    cabinet_id: i64,
    cabinet_name: String,
    cabinet_longitude: f64,
    cabinet_latitude: f64,
}

impl DoctorRecord {
    fn into_domain(self, schedule: Schedule) -> PortResult<Doctor> {
        Ok(Doctor {
            id: self.id,
            speciality: stored("speciality", &self.speciality)?,
            name: self.name,
            schedule,
            cabinet: CabinetRef {
                id: self.cabinet_id,
                name: self.cabinet_name,
                longitude: self.cabinet_longitude,
                latitude: self.cabinet_latitude,
            },
        })
    }
}

#[derive(FromRow)]
struct ScheduleRecord {
    doctor_id: i64,
    day: String,
    hours: String,
}

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    full_name: String,
    username: String,
    role: Option<String>,
}

impl UserRecord {
    fn into_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            role: self.role.as_deref().map(|r| stored("role", r)).transpose()?,
            full_name: self.full_name,
            username: self.username,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    #[sqlx(flatten)]
    user: UserRecord,
    hashed_password: String,
}

//=========================================================================================
// `PharmacyStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PharmacyStore for DbAdapter {
    async fn find_page(
        &self,
        filter: &PharmacyFilter,
        page: &PageRequest<PharmacySort>,
    ) -> PortResult<Page<Pharmacy>> {
        let (records, total) = self
            .fetch_page::<PharmacyRecord>(PageQuery {
                columns: PHARMACY_COLUMNS,
                from: "pharmacies",
                conditions: pharmacy_conditions(filter),
                order_by: pharmacy_order(page),
                limit: page.size,
                offset: page.offset(),
            })
            .await?;
        let content = records
            .into_iter()
            .map(PharmacyRecord::into_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(Page::new(content, page.page, page.size, total))
    }

    async fn find_all(&self, filter: &PharmacyFilter) -> PortResult<Vec<Pharmacy>> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM pharmacies", PHARMACY_COLUMNS));
        push_where(&mut qb, &pharmacy_conditions(filter));
        qb.push(" ORDER BY id ASC");

        qb.build_query_as::<PharmacyRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?
            .into_iter()
            .map(PharmacyRecord::into_domain)
            .collect()
    }

    async fn find_by_id(&self, id: i64) -> PortResult<Pharmacy> {
        sqlx::query_as::<_, PharmacyRecord>(&format!(
            "SELECT {} FROM pharmacies WHERE id = $1",
            PHARMACY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Pharmacy not found with id: {}", id)))?
        .into_domain()
    }

    async fn exists_by_location(&self, longitude: f64, latitude: f64) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pharmacies WHERE longitude = $1 AND latitude = $2)",
        )
        .bind(longitude)
        .bind(latitude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn exists_by_name_and_location(
        &self,
        name: &str,
        longitude: f64,
        latitude: f64,
    ) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pharmacies WHERE name = $1 AND longitude = $2 AND latitude = $3)",
        )
        .bind(name)
        .bind(longitude)
        .bind(latitude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn insert(&self, pharmacy: NewPharmacy) -> PortResult<Pharmacy> {
        sqlx::query_as::<_, PharmacyRecord>(&format!(
            "INSERT INTO pharmacies (name, longitude, latitude, region, district, image, open_tonight) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            PHARMACY_COLUMNS
        ))
        .bind(&pharmacy.name)
        .bind(pharmacy.longitude)
        .bind(pharmacy.latitude)
        .bind(pharmacy.region.as_str())
        .bind(pharmacy.district.as_str())
        .bind(&pharmacy.image)
        .bind(pharmacy.open_tonight)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("Pharmacy"))?
        .into_domain()
    }

    async fn update(&self, pharmacy: &Pharmacy) -> PortResult<Pharmacy> {
        sqlx::query_as::<_, PharmacyRecord>(&format!(
            "UPDATE pharmacies SET name = $1, longitude = $2, latitude = $3, region = $4, \
             district = $5, image = $6, open_tonight = $7 WHERE id = $8 RETURNING {}",
            PHARMACY_COLUMNS
        ))
        .bind(&pharmacy.name)
        .bind(pharmacy.longitude)
        .bind(pharmacy.latitude)
        .bind(pharmacy.region.as_str())
        .bind(pharmacy.district.as_str())
        .bind(&pharmacy.image)
        .bind(pharmacy.open_tonight)
        .bind(pharmacy.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("Pharmacy"))?
        .ok_or_else(|| PortError::NotFound(format!("Pharmacy not found with id: {}", pharmacy.id)))?
        .into_domain()
    }

    async fn update_open_tonight_bulk(&self, ids: &[i64], open_tonight: bool) -> PortResult<u64> {
        // One statement, so the flag lands on every matching row or on none.
        let result = sqlx::query("UPDATE pharmacies SET open_tonight = $1 WHERE id = ANY($2)")
            .bind(open_tonight)
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM pharmacies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Pharmacy not found with id: {}", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `CabinetStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CabinetStore for DbAdapter {
    async fn find_page(
        &self,
        filter: &CabinetFilter,
        page: &PageRequest<CabinetSort>,
    ) -> PortResult<Page<Cabinet>> {
        let (records, total) = self
            .fetch_page::<CabinetRecord>(PageQuery {
                columns: CABINET_COLUMNS,
                from: "cabinets",
                conditions: cabinet_conditions(filter),
                order_by: cabinet_order(page),
                limit: page.size,
                offset: page.offset(),
            })
            .await?;
        let content = records
            .into_iter()
            .map(CabinetRecord::into_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok(Page::new(content, page.page, page.size, total))
    }

    async fn find_by_id(&self, id: i64) -> PortResult<Cabinet> {
        sqlx::query_as::<_, CabinetRecord>(&format!(
            "SELECT {} FROM cabinets WHERE id = $1",
            CABINET_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Cabinet not found with id: {}", id)))?
        .into_domain()
    }

    async fn exists_by_location(&self, longitude: f64, latitude: f64) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cabinets WHERE longitude = $1 AND latitude = $2)",
        )
        .bind(longitude)
        .bind(latitude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn exists_by_name_and_location(
        &self,
        name: &str,
        longitude: f64,
        latitude: f64,
    ) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cabinets WHERE name = $1 AND longitude = $2 AND latitude = $3)",
        )
        .bind(name)
        .bind(longitude)
        .bind(latitude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn insert(&self, cabinet: NewCabinet) -> PortResult<Cabinet> {
        sqlx::query_as::<_, CabinetRecord>(&format!(
            "INSERT INTO cabinets (name, region, district, longitude, latitude) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CABINET_COLUMNS
        ))
        .bind(&cabinet.name)
        .bind(cabinet.region.as_str())
        .bind(cabinet.district.as_str())
        .bind(cabinet.longitude)
        .bind(cabinet.latitude)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("Cabinet"))?
        .into_domain()
    }

    async fn update(&self, cabinet: &Cabinet) -> PortResult<Cabinet> {
        sqlx::query_as::<_, CabinetRecord>(&format!(
            "UPDATE cabinets SET name = $1, region = $2, district = $3, longitude = $4, \
             latitude = $5 WHERE id = $6 RETURNING {}",
            CABINET_COLUMNS
        ))
        .bind(&cabinet.name)
        .bind(cabinet.region.as_str())
        .bind(cabinet.district.as_str())
        .bind(cabinet.longitude)
        .bind(cabinet.latitude)
        .bind(cabinet.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("Cabinet"))?
        .ok_or_else(|| PortError::NotFound(format!("Cabinet not found with id: {}", cabinet.id)))?
        .into_domain()
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        // Doctors and their schedules go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM cabinets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Cabinet not found with id: {}", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `DoctorStore` Trait Implementation
//=========================================================================================

async fn replace_schedule(
    conn: &mut PgConnection,
    doctor_id: i64,
    schedule: &Schedule,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM doctor_schedules WHERE doctor_id = $1")
        .bind(doctor_id)
        .execute(&mut *conn)
        .await?;
    if schedule.is_empty() {
        return Ok(());
    }
    let mut qb =
        QueryBuilder::<Postgres>::new("INSERT INTO doctor_schedules (doctor_id, day, hours) ");
    qb.push_values(schedule.iter(), |mut row, (day, hours)| {
        row.push_bind(doctor_id)
            .push_bind(day.clone())
            .push_bind(hours.clone());
    });
    qb.build().execute(&mut *conn).await?;
    Ok(())
}

impl DbAdapter {
    async fn schedules_for(&self, doctor_ids: &[i64]) -> PortResult<BTreeMap<i64, Schedule>> {
        let mut schedules: BTreeMap<i64, Schedule> = BTreeMap::new();
        if doctor_ids.is_empty() {
            return Ok(schedules);
        }
        let rows = sqlx::query_as::<_, ScheduleRecord>(
            "SELECT doctor_id, day, hours FROM doctor_schedules WHERE doctor_id = ANY($1)",
        )
        .bind(doctor_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        for row in rows {
            schedules.entry(row.doctor_id).or_default().insert(row.day, row.hours);
        }
        Ok(schedules)
    }

    async fn with_schedules(&self, records: Vec<DoctorRecord>) -> PortResult<Vec<Doctor>> {
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut schedules = self.schedules_for(&ids).await?;
        records
            .into_iter()
            .map(|r| {
                let schedule = schedules.remove(&r.id).unwrap_or_default();
                r.into_domain(schedule)
            })
            .collect()
    }
}

#[async_trait]
impl DoctorStore for DbAdapter {
    async fn find_page(
        &self,
        filter: &DoctorFilter,
        page: &PageRequest<DoctorSort>,
    ) -> PortResult<Page<Doctor>> {
        let (records, total) = self
            .fetch_page::<DoctorRecord>(PageQuery {
                columns: DOCTOR_COLUMNS,
                from: DOCTOR_FROM,
                conditions: doctor_conditions(filter),
                order_by: doctor_order(page),
                limit: page.size,
                offset: page.offset(),
            })
            .await?;
        let content = self.with_schedules(records).await?;
        Ok(Page::new(content, page.page, page.size, total))
    }

    async fn find_by_id(&self, id: i64) -> PortResult<Doctor> {
        let record = sqlx::query_as::<_, DoctorRecord>(&format!(
            "SELECT {} FROM {} WHERE d.id = $1",
            DOCTOR_COLUMNS, DOCTOR_FROM
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Doctor not found with id: {}", id)))?;

        let mut doctors = self.with_schedules(vec![record]).await?;
        doctors
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Doctor not found with id: {}", id)))
    }

    async fn find_by_cabinet(&self, cabinet_id: i64) -> PortResult<Vec<Doctor>> {
        let records = sqlx::query_as::<_, DoctorRecord>(&format!(
            "SELECT {} FROM {} WHERE d.cabinet_id = $1 ORDER BY d.id ASC",
            DOCTOR_COLUMNS, DOCTOR_FROM
        ))
        .bind(cabinet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        self.with_schedules(records).await
    }

    async fn exists_by_name_and_cabinet(&self, name: &str, cabinet_id: i64) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM doctors WHERE name = $1 AND cabinet_id = $2)",
        )
        .bind(name)
        .bind(cabinet_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn insert(&self, doctor: NewDoctor) -> PortResult<Doctor> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO doctors (name, speciality, cabinet_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&doctor.name)
        .bind(doctor.speciality.as_str())
        .bind(doctor.cabinet_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err("Doctor"))?;
        replace_schedule(&mut *tx, id, &doctor.schedule)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        DoctorStore::find_by_id(self, id).await
    }

    async fn update(&self, doctor: &Doctor) -> PortResult<Doctor> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE doctors SET name = $1, speciality = $2, cabinet_id = $3 WHERE id = $4 RETURNING id",
        )
        .bind(&doctor.name)
        .bind(doctor.speciality.as_str())
        .bind(doctor.cabinet.id)
        .bind(doctor.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err("Doctor"))?;
        if updated.is_none() {
            return Err(PortError::NotFound(format!("Doctor not found with id: {}", doctor.id)));
        }
        replace_schedule(&mut *tx, doctor.id, &doctor.schedule)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;

        DoctorStore::find_by_id(self, doctor.id).await
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM doctors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Doctor not found with id: {}", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (full_name, username, hashed_password, role) \
             VALUES ($1, $2, $3, $4) RETURNING id, full_name, username, role",
        )
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.hashed_password)
        .bind(user.role.map(|r| r.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("User"))?
        .into_domain()
    }

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, full_name, username, role, hashed_password FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))?;

        Ok(UserCredentials {
            user: record.user.into_domain()?,
            hashed_password: record.hashed_password,
        })
    }

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(store_err("Auth session"))?;
        Ok(())
    }

    async fn validate_auth_session(&self, token: &str) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT u.id, u.full_name, u.username, u.role \
             FROM auth_sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = $1 AND s.expires_at > NOW()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or(PortError::Unauthorized)?
        .into_domain()
    }

    async fn delete_auth_session(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_directory_core::domain::{District, Region, Speciality};

    fn where_sql(conditions: &[Condition]) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM pharmacies");
        push_where(&mut qb, conditions);
        qb.sql().to_string()
    }

    #[test]
    fn empty_filter_has_no_where_clause() {
        let conditions = pharmacy_conditions(&PharmacyFilter::default());
        assert!(conditions.is_empty());
        assert_eq!(where_sql(&conditions), "SELECT id FROM pharmacies");
    }

    #[test]
    fn pharmacy_filter_becomes_bound_predicates() {
        let filter = PharmacyFilter {
            name: Some("centr".to_string()),
            region: Some(Region::NouakchottOuest),
            district: Some(District::Ksar),
            open_tonight: Some(true),
        };
        let sql = where_sql(&pharmacy_conditions(&filter));
        assert_eq!(
            sql,
            "SELECT id FROM pharmacies WHERE POSITION(LOWER($1) IN LOWER(name)) > 0 \
             AND region = $2 AND district = $3 AND open_tonight = $4"
        );
    }

    #[test]
    fn doctor_filter_targets_the_doctor_alias() {
        let filter = DoctorFilter {
            name: None,
            speciality: Some(Speciality::Pediatrics),
        };
        assert_eq!(
            doctor_conditions(&filter),
            vec![Condition::TextEquals("d.speciality", "PEDIATRICS".to_string())]
        );
    }

    #[test]
    fn ordering_always_ends_with_id_tiebreaker() {
        let page =
            PageRequest::new(0, 10, PharmacySort::OpenTonight, SortDirection::Descending).unwrap();
        assert_eq!(pharmacy_order(&page), "open_tonight DESC, id ASC");

        let page = PageRequest::new(0, 10, CabinetSort::Name, SortDirection::Ascending).unwrap();
        assert_eq!(cabinet_order(&page), "name ASC, id ASC");

        let page = PageRequest::new(0, 10, DoctorSort::Speciality, SortDirection::Ascending).unwrap();
        assert_eq!(doctor_order(&page), "d.speciality ASC, d.id ASC");
    }

    #[test]
    fn unknown_stored_label_is_unexpected() {
        let err = stored::<Region>("region", "ATLANTIS").unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }
}
