use std::env;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};

use crate::error_handling::types::StorageError;
use crate::storage::db_entities::{dogs, owners};
use crate::storage::storage_trait::Storage;
use crate::storage::types::{Dog, DogFilter, NewDog, NewOwner, Owner, Page};

/// How long a writer waits for the SQLite write lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS owners (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        city TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS dogs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        birth_date TEXT NOT NULL,
        weight REAL NOT NULL,
        owner_id INTEGER REFERENCES owners(id) ON DELETE SET NULL,
        sex TEXT NOT NULL,
        sterilized INTEGER NOT NULL
    );",
    "CREATE INDEX IF NOT EXISTS idx_dogs_owner_id ON dogs(owner_id);",
];

fn read_failed(err: DbErr) -> StorageError {
    error!("Storage read failed: {}", err);
    StorageError::ReadFailed
}

fn write_failed(err: DbErr) -> StorageError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg))
        | Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
            warn!("Write rejected by constraint: {}", msg);
            StorageError::ConstraintViolation(msg)
        }
        _ => {
            error!("Storage write failed: {}", err);
            StorageError::WriteFailed
        }
    }
}

/// A dog write that trips the owner foreign key names a missing owner.
fn owner_or_write_failed(err: DbErr, owner_id: i32) -> StorageError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            warn!("Refusing dog for missing owner {}", owner_id);
            StorageError::MissingOwner(owner_id)
        }
        _ => write_failed(err),
    }
}

/// `ActiveModel::update` matched no row.
fn not_updated(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotUpdated | DbErr::RecordNotFound(_))
}

impl From<owners::Model> for Owner {
    fn from(model: owners::Model) -> Self {
        Owner {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            city: model.city,
            postal_code: model.postal_code,
            email: model.email,
            phone: model.phone,
        }
    }
}

fn into_dog(model: dogs::Model) -> Result<Dog, StorageError> {
    let sex = model.sex.parse().map_err(|_| {
        error!("Dog {} has unknown sex '{}'", model.id, model.sex);
        StorageError::ReadFailed
    })?;
    Ok(Dog {
        id: model.id,
        name: model.name,
        birth_date: model.birth_date,
        weight: model.weight,
        owner_id: model.owner_id,
        sex,
        sterilized: model.sterilized,
    })
}

fn into_dogs(models: Vec<dogs::Model>) -> Result<Vec<Dog>, StorageError> {
    models.into_iter().map(into_dog).collect()
}

fn owner_active_model(owner: &NewOwner) -> owners::ActiveModel {
    owners::ActiveModel {
        id: NotSet,
        first_name: Set(owner.first_name.clone()),
        last_name: Set(owner.last_name.clone()),
        city: Set(owner.city.clone()),
        postal_code: Set(owner.postal_code.clone()),
        email: Set(owner.email.clone()),
        phone: Set(owner.phone.clone()),
    }
}

fn dog_active_model(dog: &NewDog) -> dogs::ActiveModel {
    dogs::ActiveModel {
        id: NotSet,
        name: Set(dog.name.clone()),
        birth_date: Set(dog.birth_date),
        weight: Set(dog.weight),
        owner_id: Set(Some(dog.owner_id)),
        sex: Set(dog.sex.as_str().to_string()),
        sterilized: Set(dog.sterilized),
    }
}

/// SQLite-backed storage. Each operation checks a connection out of the pool
/// and returns it when done.
pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    /// Default database filename used in the application's working directory
    pub const DEFAULT_DB_FILE: &'static str = "kennel.sqlite3";

    /// Create or open the database in the current working directory with the default filename
    pub async fn new() -> Result<Self, StorageError> {
        let cwd = env::current_dir().map_err(|e| {
            error!("Failed to get current dir: {}", e);
            StorageError::ConnectionFailed
        })?;
        Self::new_file(cwd.join(Self::DEFAULT_DB_FILE)).await
    }

    /// Open (creating if missing) the database at `path` and ensure the schema exists.
    pub async fn new_file<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create database dir {}: {}", parent.display(), e);
                StorageError::WriteFailed
            })?;
        }

        // Every pooled connection enforces foreign keys; owner deletion relies on ON DELETE SET NULL.
        let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
        opts.max_connections(5)
            .sqlx_logging(false)
            .map_sqlx_sqlite_opts(|o| o.foreign_keys(true).busy_timeout(BUSY_TIMEOUT));
        let db = Database::connect(opts).await.map_err(|e| {
            error!("Failed to open database {}: {}", path.display(), e);
            StorageError::ConnectionFailed
        })?;

        for statement in SCHEMA {
            db.execute_unprepared(statement).await.map_err(write_failed)?;
        }

        info!("DatabaseStorage initialized at {}", path.display());
        Ok(Self { db })
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn create_owner(&self, owner: &NewOwner) -> Result<Owner, StorageError> {
        let model = owner_active_model(owner)
            .insert(&self.db)
            .await
            .map_err(write_failed)?;
        info!("Created owner {}", model.id);
        Ok(model.into())
    }

    async fn get_owner(&self, id: i32) -> Result<Option<Owner>, StorageError> {
        debug!("Fetching owner {}", id);
        let model = owners::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(read_failed)?;
        Ok(model.map(Owner::from))
    }

    async fn list_owners(&self, page: Page) -> Result<Vec<Owner>, StorageError> {
        let models = owners::Entity::find()
            .order_by_asc(owners::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(read_failed)?;
        Ok(models.into_iter().map(Owner::from).collect())
    }

    async fn update_owner(
        &self,
        id: i32,
        owner: &NewOwner,
    ) -> Result<Option<Owner>, StorageError> {
        let mut active = owner_active_model(owner);
        active.id = Unchanged(id);
        match active.update(&self.db).await {
            Ok(model) => {
                info!("Updated owner {}", id);
                Ok(Some(model.into()))
            }
            Err(e) if not_updated(&e) => Ok(None),
            Err(e) => Err(write_failed(e)),
        }
    }

    async fn delete_owner(&self, id: i32) -> Result<bool, StorageError> {
        // dogs.owner_id is cleared by the foreign key in the same statement
        let deleted = owners::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(write_failed)?;
        if deleted.rows_affected > 0 {
            info!("Deleted owner {}, their dogs are left without owner", id);
        }
        Ok(deleted.rows_affected > 0)
    }

    async fn create_dog(&self, dog: &NewDog) -> Result<Dog, StorageError> {
        let model = dog_active_model(dog)
            .insert(&self.db)
            .await
            .map_err(|e| owner_or_write_failed(e, dog.owner_id))?;
        info!("Created dog {} for owner {}", model.id, dog.owner_id);
        into_dog(model)
    }

    async fn get_dog(&self, id: i32) -> Result<Option<Dog>, StorageError> {
        debug!("Fetching dog {}", id);
        dogs::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(read_failed)?
            .map(into_dog)
            .transpose()
    }

    async fn list_dogs(&self, page: Page) -> Result<Vec<Dog>, StorageError> {
        let models = dogs::Entity::find()
            .order_by_asc(dogs::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(read_failed)?;
        into_dogs(models)
    }

    async fn update_dog(&self, id: i32, dog: &NewDog) -> Result<Option<Dog>, StorageError> {
        let mut active = dog_active_model(dog);
        active.id = Unchanged(id);
        match active.update(&self.db).await {
            Ok(model) => {
                info!("Updated dog {}", id);
                into_dog(model).map(Some)
            }
            Err(e) if not_updated(&e) => Ok(None),
            Err(e) => Err(owner_or_write_failed(e, dog.owner_id)),
        }
    }

    async fn delete_dog(&self, id: i32) -> Result<bool, StorageError> {
        let deleted = dogs::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(write_failed)?;
        if deleted.rows_affected > 0 {
            info!("Deleted dog {}", id);
        }
        Ok(deleted.rows_affected > 0)
    }

    async fn find_dogs(&self, filter: DogFilter) -> Result<Vec<Dog>, StorageError> {
        debug!("Searching dogs by {:?}", filter);
        let query = match filter {
            DogFilter::City(city) => dogs::Entity::find()
                .inner_join(owners::Entity)
                .filter(owners::Column::City.eq(city)),
            DogFilter::OwnerName {
                first_name,
                last_name,
            } => dogs::Entity::find()
                .inner_join(owners::Entity)
                .filter(owners::Column::FirstName.eq(first_name))
                .filter(owners::Column::LastName.eq(last_name)),
            DogFilter::Sex(sex) => dogs::Entity::find().filter(dogs::Column::Sex.eq(sex.as_str())),
            DogFilter::Sterilized(flag) => {
                dogs::Entity::find().filter(dogs::Column::Sterilized.eq(flag))
            }
        };
        let models = query
            .order_by_asc(dogs::Column::Id)
            .all(&self.db)
            .await
            .map_err(read_failed)?;
        into_dogs(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::dog_filter;
    use crate::storage::types::Sex;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn temp_db() -> (TempDir, DatabaseStorage) {
        let dir = TempDir::new().unwrap();
        let storage = DatabaseStorage::new_file(dir.path().join("test.sqlite3"))
            .await
            .unwrap();
        (dir, storage)
    }

    fn owner(email: &str, first: &str, last: &str, city: &str) -> NewOwner {
        NewOwner {
            first_name: first.into(),
            last_name: last.into(),
            city: city.into(),
            postal_code: "28001".into(),
            email: email.into(),
            phone: "600123456".into(),
        }
    }

    fn dog(name: &str, owner_id: i32, sex: Sex, sterilized: bool) -> NewDog {
        NewDog {
            name: name.into(),
            birth_date: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
            weight: 12.5,
            owner_id,
            sex,
            sterilized,
        }
    }

    #[tokio::test]
    async fn test_owner_roundtrip_and_unique_email() {
        let (_dir, storage) = temp_db().await;
        let input = owner("ana@example.com", "Ana", "García López", "Madrid");
        let created = storage.create_owner(&input).await.unwrap();
        assert!(created.id > 0);

        let fetched = storage.get_owner(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.email, input.email);
        assert_eq!(fetched.last_name, input.last_name);

        let dup = storage
            .create_owner(&owner("ana@example.com", "Other", "Person", "Bilbao"))
            .await;
        assert!(matches!(dup, Err(StorageError::ConstraintViolation(_))));
        assert_eq!(storage.list_owners(Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dog_with_missing_owner_is_not_persisted() {
        let (_dir, storage) = temp_db().await;
        let result = storage.create_dog(&dog("Rex", 9999, Sex::Male, false)).await;
        assert_eq!(result, Err(StorageError::MissingOwner(9999)));
        assert!(storage.list_dogs(Page::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dog_roundtrip() {
        let (_dir, storage) = temp_db().await;
        let o = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();
        let input = dog("Luna", o.id, Sex::Female, true);
        let created = storage.create_dog(&input).await.unwrap();
        let fetched = storage.get_dog(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.birth_date, input.birth_date);
        assert_eq!(fetched.weight, input.weight);
        assert_eq!(fetched.owner_id, Some(o.id));
        assert_eq!(fetched.sex, Sex::Female);
        assert!(fetched.sterilized);
    }

    #[tokio::test]
    async fn test_update_unknown_ids_write_nothing() {
        let (_dir, storage) = temp_db().await;
        let o = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();
        let updated = storage
            .update_owner(o.id + 1, &owner("x@y.es", "X", "Y", "Z"))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert!(storage.update_dog(42, &dog("Rex", o.id, Sex::Male, false)).await.unwrap().is_none());
        assert_eq!(storage.get_owner(o.id).await.unwrap().unwrap(), o);
    }

    #[tokio::test]
    async fn test_update_replaces_all_fields() {
        let (_dir, storage) = temp_db().await;
        let a = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();
        let b = storage
            .create_owner(&owner("b@b.es", "Luis", "Pérez", "Sevilla"))
            .await
            .unwrap();
        let d = storage.create_dog(&dog("Rex", a.id, Sex::Male, false)).await.unwrap();

        let mut replacement = dog("Max", b.id, Sex::Male, true);
        replacement.weight = 30.0;
        let updated = storage.update_dog(d.id, &replacement).await.unwrap().unwrap();
        assert_eq!(updated.id, d.id);
        assert_eq!(updated.name, "Max");
        assert_eq!(updated.owner_id, Some(b.id));
        assert_eq!(updated.weight, 30.0);
        assert!(updated.sterilized);

        let moved = storage
            .update_dog(d.id, &dog("Max", 9999, Sex::Male, true))
            .await;
        assert_eq!(moved, Err(StorageError::MissingOwner(9999)));
        assert_eq!(storage.get_dog(d.id).await.unwrap().unwrap(), updated);

        let clash = storage
            .update_owner(b.id, &owner("a@b.es", "Luis", "Pérez", "Sevilla"))
            .await;
        assert!(matches!(clash, Err(StorageError::ConstraintViolation(_))));
    }

    #[tokio::test]
    async fn test_delete_twice_and_ids_not_reused() {
        let (_dir, storage) = temp_db().await;
        let o = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();
        let d = storage.create_dog(&dog("Rex", o.id, Sex::Male, false)).await.unwrap();

        assert!(storage.delete_dog(d.id).await.unwrap());
        assert!(!storage.delete_dog(d.id).await.unwrap());
        assert!(storage.get_dog(d.id).await.unwrap().is_none());

        let next = storage.create_dog(&dog("Rex", o.id, Sex::Male, false)).await.unwrap();
        assert!(next.id > d.id);
    }

    #[tokio::test]
    async fn test_delete_owner_orphans_dogs() {
        let (_dir, storage) = temp_db().await;
        let o = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();
        let d = storage.create_dog(&dog("Rex", o.id, Sex::Male, false)).await.unwrap();

        assert!(storage.delete_owner(o.id).await.unwrap());
        assert!(!storage.delete_owner(o.id).await.unwrap());
        assert!(storage.get_owner(o.id).await.unwrap().is_none());

        let orphan = storage.get_dog(d.id).await.unwrap().unwrap();
        assert_eq!(orphan.owner_id, None);
        assert!(storage
            .find_dogs(dog_filter::by_city("Madrid"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_filters() {
        let (_dir, storage) = temp_db().await;
        let madrid = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();
        let sevilla = storage
            .create_owner(&owner("b@b.es", "Luis", "Ruiz", "Sevilla"))
            .await
            .unwrap();
        let rex = storage.create_dog(&dog("Rex", madrid.id, Sex::Male, false)).await.unwrap();
        let luna = storage.create_dog(&dog("Luna", madrid.id, Sex::Female, true)).await.unwrap();
        let max = storage.create_dog(&dog("Max", sevilla.id, Sex::Male, true)).await.unwrap();

        let ids = |dogs: Vec<Dog>| dogs.into_iter().map(|d| d.id).collect::<Vec<_>>();

        assert_eq!(
            ids(storage.find_dogs(dog_filter::by_city("Madrid")).await.unwrap()),
            vec![rex.id, luna.id]
        );
        assert!(storage.find_dogs(dog_filter::by_city("madrid")).await.unwrap().is_empty());
        assert!(storage.find_dogs(dog_filter::by_city("Lugo")).await.unwrap().is_empty());

        assert_eq!(
            ids(storage.find_dogs(dog_filter::by_owner_name("Luis", "Ruiz")).await.unwrap()),
            vec![max.id]
        );
        assert!(storage
            .find_dogs(dog_filter::by_owner_name("Ana", "Pérez"))
            .await
            .unwrap()
            .is_empty());

        assert_eq!(
            ids(storage.find_dogs(DogFilter::Sex(Sex::Male)).await.unwrap()),
            vec![rex.id, max.id]
        );
        assert_eq!(
            ids(storage.find_dogs(DogFilter::Sterilized(true)).await.unwrap()),
            vec![luna.id, max.id]
        );
        assert_eq!(
            ids(storage.find_dogs(DogFilter::Sterilized(false)).await.unwrap()),
            vec![rex.id]
        );
    }

    #[tokio::test]
    async fn test_pagination() {
        let (_dir, storage) = temp_db().await;
        for i in 0..5 {
            storage
                .create_owner(&owner(&format!("o{}@b.es", i), "Ana", "Ruiz", "Madrid"))
                .await
                .unwrap();
        }
        let page = storage.list_owners(Page { skip: 1, limit: 2 }).await.unwrap();
        let emails: Vec<_> = page.iter().map(|o| o.email.as_str()).collect();
        assert_eq!(emails, vec!["o1@b.es", "o2@b.es"]);
        let tail = storage.list_owners(Page { skip: 4, limit: 10 }).await.unwrap();
        assert_eq!(tail.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_all_succeed() {
        let (_dir, storage) = temp_db().await;
        let storage = Arc::new(storage);
        let o = storage
            .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for i in 0..40 {
            let storage = Arc::clone(&storage);
            let sex = if i % 2 == 0 { Sex::Male } else { Sex::Female };
            tasks.push(tokio::spawn(async move {
                let created = storage.create_dog(&dog(&format!("Dog {}", i), o.id, sex, false)).await?;
                storage
                    .update_dog(created.id, &dog(&format!("Dog {}", i), o.id, sex, true))
                    .await
            }));
        }
        for task in tasks {
            let updated = task.await.unwrap().unwrap();
            assert!(updated.unwrap().sterilized);
        }

        let all = storage.list_dogs(Page { skip: 0, limit: 100 }).await.unwrap();
        assert_eq!(all.len(), 40);

        // any pooled connection clears owner_id through the foreign key
        assert!(storage.delete_owner(o.id).await.unwrap());
        let all = storage.list_dogs(Page { skip: 0, limit: 100 }).await.unwrap();
        assert!(all.iter().all(|d| d.owner_id.is_none()));
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("kennel.sqlite3");
        let id = {
            let storage = DatabaseStorage::new_file(&path).await.unwrap();
            storage
                .create_owner(&owner("a@b.es", "Ana", "Ruiz", "Madrid"))
                .await
                .unwrap()
                .id
        };
        let storage = DatabaseStorage::new_file(&path).await.unwrap();
        assert!(storage.get_owner(id).await.unwrap().is_some());
    }
}
