use crate::db::models::{
    Contact, NewContact, NewVisitor, Photo, Scope, Visitor, VisitorPatch, VisitorRow, Voice,
};
use crate::db::sqlite::Storage;
use crate::error::DeskError;
use sqlx::{Sqlite, SqliteExecutor, Transaction};
use std::collections::HashMap;

const VISITOR_COLUMNS: &str = r#"id, first_name, last_name, academic_degree, company_name,
    job_position, field_of_activity, is_manufacturer, is_trader, is_distributor, note,
    created_by, created_at, updated_at"#;

pub(crate) const CONTACT_COLUMNS: &str = "c.id, c.visitor_id, c.type, c.value, c.label";
pub(crate) const PHOTO_COLUMNS: &str = "p.id, p.visitor_id, p.filename, p.url, p.original_name";
pub(crate) const VOICE_COLUMNS: &str =
    "s.id, s.visitor_id, s.filename, s.url, s.mime_type, s.duration_ms";

/// Id of the visitor when it is live and inside `scope`.
pub(crate) async fn visible_visitor<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    scope: Scope,
) -> Result<Option<i64>, DeskError> {
    let owner = scope.owner();
    let row: Option<(i64,)> = sqlx::query_as(
        r#"SELECT id FROM visitors
           WHERE id = ? AND deleted_at IS NULL AND (? IS NULL OR created_by = ?)"#,
    )
    .bind(id)
    .bind(owner)
    .bind(owner)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(|r| r.0))
}

pub(crate) async fn insert_contacts(
    tx: &mut Transaction<'_, Sqlite>,
    visitor_id: i64,
    contacts: &[NewContact],
) -> Result<(), DeskError> {
    for c in contacts {
        sqlx::query("INSERT INTO contacts (visitor_id, type, value, label) VALUES (?, ?, ?, ?)")
            .bind(visitor_id)
            .bind(c.kind)
            .bind(&c.value)
            .bind(&c.label)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn group_by_visitor<T>(items: Vec<T>, key: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}

impl Storage {
    /// Live visitors in `scope`, newest first, with their live children.
    pub async fn list_visitors(&self, scope: Scope) -> Result<Vec<Visitor>, DeskError> {
        let owner = scope.owner();
        let rows = sqlx::query_as::<_, VisitorRow>(&format!(
            r#"SELECT {VISITOR_COLUMNS} FROM visitors
               WHERE deleted_at IS NULL AND (? IS NULL OR created_by = ?)
               ORDER BY created_at DESC, id DESC"#
        ))
        .bind(owner)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // Children of every visible visitor, fetched once per table.
        let visible = r#"JOIN visitors v ON v.id = {alias}.visitor_id
            WHERE {alias}.deleted_at IS NULL AND v.deleted_at IS NULL
              AND (? IS NULL OR v.created_by = ?)
            ORDER BY {alias}.id"#;

        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts c {}",
            visible.replace("{alias}", "c")
        ))
        .bind(owner)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        let photos = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos p {}",
            visible.replace("{alias}", "p")
        ))
        .bind(owner)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        let voices = sqlx::query_as::<_, Voice>(&format!(
            "SELECT {VOICE_COLUMNS} FROM voices s {}",
            visible.replace("{alias}", "s")
        ))
        .bind(owner)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let mut contacts = group_by_visitor(contacts, |c| c.visitor_id);
        let mut photos = group_by_visitor(photos, |p| p.visitor_id);
        let mut voices = group_by_visitor(voices, |s| s.visitor_id);

        Ok(rows
            .into_iter()
            .map(|row| Visitor {
                contacts: contacts.remove(&row.id).unwrap_or_default(),
                photos: photos.remove(&row.id).unwrap_or_default(),
                voices: voices.remove(&row.id).unwrap_or_default(),
                row,
            })
            .collect())
    }

    pub async fn get_visitor(&self, id: i64, scope: Scope) -> Result<Option<Visitor>, DeskError> {
        let owner = scope.owner();
        let Some(row) = sqlx::query_as::<_, VisitorRow>(&format!(
            r#"SELECT {VISITOR_COLUMNS} FROM visitors
               WHERE id = ? AND deleted_at IS NULL AND (? IS NULL OR created_by = ?)"#
        ))
        .bind(id)
        .bind(owner)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts c WHERE c.visitor_id = ? AND c.deleted_at IS NULL ORDER BY c.id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let photos = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos p WHERE p.visitor_id = ? AND p.deleted_at IS NULL ORDER BY p.id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let voices = sqlx::query_as::<_, Voice>(&format!(
            "SELECT {VOICE_COLUMNS} FROM voices s WHERE s.visitor_id = ? AND s.deleted_at IS NULL ORDER BY s.id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Visitor {
            row,
            contacts,
            photos,
            voices,
        }))
    }

    pub async fn visitor_visible(&self, id: i64, scope: Scope) -> Result<bool, DeskError> {
        Ok(visible_visitor(&self.pool, id, scope).await?.is_some())
    }

    /// Insert a visitor and its contacts in one transaction.
    pub async fn create_visitor(
        &self,
        new: NewVisitor,
        created_by: i64,
    ) -> Result<Visitor, DeskError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"INSERT INTO visitors (
                first_name, last_name, academic_degree, company_name, job_position,
                field_of_activity, is_manufacturer, is_trader, is_distributor, note, created_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.academic_degree)
        .bind(&new.company_name)
        .bind(&new.job_position)
        .bind(&new.field_of_activity)
        .bind(new.is_manufacturer)
        .bind(new.is_trader)
        .bind(new.is_distributor)
        .bind(&new.note)
        .bind(created_by)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        insert_contacts(&mut tx, id, &new.contacts).await?;
        tx.commit().await?;

        self.get_visitor(id, Scope::All)
            .await?
            .ok_or(DeskError::NotFound("Visitor"))
    }

    /// COALESCE-style partial update. A supplied contact list replaces the
    /// live contacts: old rows are soft-deleted, new rows inserted.
    pub async fn update_visitor(
        &self,
        id: i64,
        patch: VisitorPatch,
        scope: Scope,
    ) -> Result<Option<Visitor>, DeskError> {
        let mut tx = self.pool.begin().await?;
        if visible_visitor(&mut *tx, id, scope).await?.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"UPDATE visitors SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                academic_degree = COALESCE(?, academic_degree),
                company_name = COALESCE(?, company_name),
                job_position = COALESCE(?, job_position),
                field_of_activity = COALESCE(?, field_of_activity),
                is_manufacturer = COALESCE(?, is_manufacturer),
                is_trader = COALESCE(?, is_trader),
                is_distributor = COALESCE(?, is_distributor),
                note = COALESCE(?, note),
                updated_at = CURRENT_TIMESTAMP
              WHERE id = ?"#,
        )
        .bind(patch.first_name)
        .bind(patch.last_name)
        .bind(patch.academic_degree)
        .bind(patch.company_name)
        .bind(patch.job_position)
        .bind(patch.field_of_activity)
        .bind(patch.is_manufacturer)
        .bind(patch.is_trader)
        .bind(patch.is_distributor)
        .bind(patch.note)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(contacts) = patch.contacts {
            sqlx::query(
                "UPDATE contacts SET deleted_at = CURRENT_TIMESTAMP WHERE visitor_id = ? AND deleted_at IS NULL",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            insert_contacts(&mut tx, id, &contacts).await?;
        }
        tx.commit().await?;

        self.get_visitor(id, scope).await
    }

    /// Children are left untouched; they disappear with their visitor.
    pub async fn soft_delete_visitor(&self, id: i64, scope: Scope) -> Result<bool, DeskError> {
        let owner = scope.owner();
        let res = sqlx::query(
            r#"UPDATE visitors SET deleted_at = CURRENT_TIMESTAMP
               WHERE id = ? AND deleted_at IS NULL AND (? IS NULL OR created_by = ?)"#,
        )
        .bind(id)
        .bind(owner)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
