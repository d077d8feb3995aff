//! Visitor children: contacts, photos and voice notes.
//!
//! Every mutation first checks that the owning visitor is live and inside
//! the caller's scope; otherwise the row is reported as missing.

use crate::db::models::{Contact, ContactPatch, NewContact, NewPhoto, NewVoice, Photo, Scope, Voice};
use crate::db::sqlite::Storage;
use crate::db::visitors::{CONTACT_COLUMNS, PHOTO_COLUMNS, VOICE_COLUMNS, visible_visitor};
use crate::error::DeskError;

/// Restricts a child table (or its alias) to rows whose visitor is live and in scope.
/// Binds the scope owner twice.
fn in_scope(alias: &str) -> String {
    format!(
        r#"{alias}.deleted_at IS NULL AND {alias}.visitor_id IN (
            SELECT id FROM visitors WHERE deleted_at IS NULL AND (? IS NULL OR created_by = ?))"#
    )
}

impl Storage {
    pub async fn get_contact(&self, id: i64, scope: Scope) -> Result<Option<Contact>, DeskError> {
        let owner = scope.owner();
        let contact = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts c WHERE c.id = ? AND {}",
            in_scope("c")
        ))
        .bind(id)
        .bind(owner)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    pub async fn add_contact(
        &self,
        visitor_id: i64,
        contact: NewContact,
        scope: Scope,
    ) -> Result<Option<Contact>, DeskError> {
        let mut tx = self.pool.begin().await?;
        if visible_visitor(&mut *tx, visitor_id, scope).await?.is_none() {
            return Ok(None);
        }
        let result =
            sqlx::query("INSERT INTO contacts (visitor_id, type, value, label) VALUES (?, ?, ?, ?)")
                .bind(visitor_id)
                .bind(contact.kind)
                .bind(&contact.value)
                .bind(&contact.label)
                .execute(&mut *tx)
                .await?;
        tx.commit().await?;
        self.get_contact(result.last_insert_rowid(), scope).await
    }

    pub async fn update_contact(
        &self,
        id: i64,
        patch: ContactPatch,
        scope: Scope,
    ) -> Result<Option<Contact>, DeskError> {
        let owner = scope.owner();
        let res = sqlx::query(&format!(
            r#"UPDATE contacts SET
                type = COALESCE(?, type),
                value = COALESCE(?, value),
                label = COALESCE(?, label)
              WHERE contacts.id = ? AND {}"#,
            in_scope("contacts")
        ))
        .bind(patch.kind)
        .bind(patch.value)
        .bind(patch.label)
        .bind(id)
        .bind(owner)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_contact(id, scope).await
    }

    pub async fn soft_delete_contact(&self, id: i64, scope: Scope) -> Result<bool, DeskError> {
        self.soft_delete_child("contacts", id, scope).await
    }

    /// Insert photo rows for files already written to disk.
    pub async fn add_photos(
        &self,
        visitor_id: i64,
        photos: Vec<NewPhoto>,
        scope: Scope,
    ) -> Result<Option<Vec<Photo>>, DeskError> {
        let mut tx = self.pool.begin().await?;
        if visible_visitor(&mut *tx, visitor_id, scope).await?.is_none() {
            return Ok(None);
        }
        let mut created = Vec::with_capacity(photos.len());
        for p in photos {
            let result = sqlx::query(
                "INSERT INTO photos (visitor_id, filename, url, original_name) VALUES (?, ?, ?, ?)",
            )
            .bind(visitor_id)
            .bind(&p.filename)
            .bind(&p.url)
            .bind(&p.original_name)
            .execute(&mut *tx)
            .await?;
            created.push(Photo {
                id: result.last_insert_rowid(),
                visitor_id,
                filename: p.filename,
                url: p.url,
                original_name: p.original_name,
            });
        }
        tx.commit().await?;
        Ok(Some(created))
    }

    pub async fn get_photo(&self, id: i64, scope: Scope) -> Result<Option<Photo>, DeskError> {
        let owner = scope.owner();
        let photo = sqlx::query_as::<_, Photo>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM photos p WHERE p.id = ? AND {}",
            in_scope("p")
        ))
        .bind(id)
        .bind(owner)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(photo)
    }

    /// The file stays on disk.
    pub async fn soft_delete_photo(&self, id: i64, scope: Scope) -> Result<bool, DeskError> {
        self.soft_delete_child("photos", id, scope).await
    }

    pub async fn add_voice(
        &self,
        visitor_id: i64,
        voice: NewVoice,
        scope: Scope,
    ) -> Result<Option<Voice>, DeskError> {
        let mut tx = self.pool.begin().await?;
        if visible_visitor(&mut *tx, visitor_id, scope).await?.is_none() {
            return Ok(None);
        }
        let result = sqlx::query(
            r#"INSERT INTO voices (visitor_id, filename, url, mime_type, duration_ms)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(visitor_id)
        .bind(&voice.filename)
        .bind(&voice.url)
        .bind(&voice.mime_type)
        .bind(voice.duration_ms)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(Some(Voice {
            id: result.last_insert_rowid(),
            visitor_id,
            filename: voice.filename,
            url: voice.url,
            mime_type: voice.mime_type,
            duration_ms: voice.duration_ms,
        }))
    }

    pub async fn get_voice(&self, id: i64, scope: Scope) -> Result<Option<Voice>, DeskError> {
        let owner = scope.owner();
        let voice = sqlx::query_as::<_, Voice>(&format!(
            "SELECT {VOICE_COLUMNS} FROM voices s WHERE s.id = ? AND {}",
            in_scope("s")
        ))
        .bind(id)
        .bind(owner)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(voice)
    }

    pub async fn soft_delete_voice(&self, id: i64, scope: Scope) -> Result<bool, DeskError> {
        self.soft_delete_child("voices", id, scope).await
    }

    async fn soft_delete_child(
        &self,
        table: &'static str,
        id: i64,
        scope: Scope,
    ) -> Result<bool, DeskError> {
        let owner = scope.owner();
        let res = sqlx::query(&format!(
            "UPDATE {table} SET deleted_at = CURRENT_TIMESTAMP WHERE {table}.id = ? AND {}",
            in_scope(table)
        ))
        .bind(id)
        .bind(owner)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ContactType, NewVisitor, Role};
    use crate::db::sqlite::connect;

    async fn storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("t.sqlite").display());
        (dir, connect(&url).await.unwrap())
    }

    fn visitor(name: &str) -> NewVisitor {
        NewVisitor {
            first_name: name.to_string(),
            last_name: "K".to_string(),
            academic_degree: None,
            company_name: None,
            job_position: None,
            field_of_activity: None,
            is_manufacturer: false,
            is_trader: false,
            is_distributor: false,
            note: None,
            contacts: vec![NewContact {
                kind: ContactType::Phone,
                value: "09121234567".to_string(),
                label: None,
            }],
        }
    }

    #[tokio::test]
    async fn children_follow_visitor_scope_and_soft_delete() {
        let (_dir, db) = storage().await;
        let owner = db.create_user("sara", "x", Role::User).await.unwrap();
        let other = db.create_user("omid", "x", Role::User).await.unwrap();
        let mine = Scope::Owner(owner.id);
        let theirs = Scope::Owner(other.id);
        let v = db.create_visitor(visitor("Ali"), owner.id).await.unwrap();

        let voice = NewVoice {
            filename: "a.webm".to_string(),
            url: "/uploads/a.webm".to_string(),
            mime_type: Some("audio/webm".to_string()),
            duration_ms: Some(900),
        };
        assert!(db.add_voice(v.row.id, voice.clone(), theirs).await.unwrap().is_none());
        let stored = db.add_voice(v.row.id, voice, mine).await.unwrap().unwrap();
        assert_eq!(db.get_voice(stored.id, mine).await.unwrap(), Some(stored.clone()));
        assert!(db.get_voice(stored.id, theirs).await.unwrap().is_none());

        let photos = vec![NewPhoto {
            filename: "p.jpg".to_string(),
            url: "/uploads/p.jpg".to_string(),
            original_name: Some("card.jpg".to_string()),
        }];
        let photos = db.add_photos(v.row.id, photos, Scope::All).await.unwrap().unwrap();
        assert!(db.get_photo(photos[0].id, mine).await.unwrap().is_some());

        // Children of a deleted visitor become unreachable.
        assert!(db.soft_delete_visitor(v.row.id, mine).await.unwrap());
        assert!(db.get_voice(stored.id, Scope::All).await.unwrap().is_none());
        assert!(db.get_photo(photos[0].id, Scope::All).await.unwrap().is_none());
        assert!(!db.soft_delete_photo(photos[0].id, Scope::All).await.unwrap());

        // ...and accepts no new ones.
        let contact = NewContact {
            kind: ContactType::Email,
            value: "ali@example.com".to_string(),
            label: None,
        };
        assert!(db.add_contact(v.row.id, contact, Scope::All).await.unwrap().is_none());
        let late = vec![NewPhoto {
            filename: "q.jpg".to_string(),
            url: "/uploads/q.jpg".to_string(),
            original_name: None,
        }];
        assert!(db.add_photos(v.row.id, late, Scope::All).await.unwrap().is_none());
        let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE visitor_id = ?")
            .bind(v.row.id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(rows.0, 1);
    }

    #[tokio::test]
    async fn contact_patch_keeps_unspecified_fields() {
        let (_dir, db) = storage().await;
        let admin = db.create_user("root", "x", Role::Admin).await.unwrap();
        let v = db.create_visitor(visitor("Ali"), admin.id).await.unwrap();
        let contact = &v.contacts[0];

        let patch = ContactPatch {
            label: Some("mobile".to_string()),
            ..ContactPatch::default()
        };
        let updated = db
            .update_contact(contact.id, patch, Scope::All)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.kind, ContactType::Phone);
        assert_eq!(updated.value, "09121234567");
        assert_eq!(updated.label.as_deref(), Some("mobile"));

        assert!(db.soft_delete_contact(contact.id, Scope::All).await.unwrap());
        assert!(db.get_contact(contact.id, Scope::All).await.unwrap().is_none());
    }
}
