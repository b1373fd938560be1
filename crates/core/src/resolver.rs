//! Mapping polymorphic references back to host records.
//!
//! Votes only store a `(type, id)` pair. A [`ResolverRegistry`] holds one
//! [`EntityResolver`] per type tag and turns such pairs into values of a
//! host-chosen type `T`, typically an enum over the host's voter entities.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter};
use thumbs_up_common::{AppError, AppResult};
use thumbs_up_db::{PolymorphicRef, Voter};

/// Looks up a record of one entity type by id.
#[async_trait]
pub trait EntityResolver<T>: Send + Sync {
    /// Fetch the record, or `None` if it no longer exists.
    async fn resolve(&self, id: i64) -> AppResult<Option<T>>;
}

/// Type tag to resolver map.
pub struct ResolverRegistry<T> {
    resolvers: HashMap<String, Arc<dyn EntityResolver<T>>>,
}

impl<T> Default for ResolverRegistry<T> {
    fn default() -> Self {
        Self {
            resolvers: HashMap::new(),
        }
    }
}

impl<T: Send + 'static> ResolverRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for records tagged `kind`, replacing any previous one.
    #[must_use]
    pub fn with<R>(mut self, kind: impl Into<String>, resolver: R) -> Self
    where
        R: EntityResolver<T> + 'static,
    {
        self.register(kind, resolver);
        self
    }

    /// Register `resolver` for records tagged `kind`, replacing any previous one.
    pub fn register<R>(&mut self, kind: impl Into<String>, resolver: R)
    where
        R: EntityResolver<T> + 'static,
    {
        self.resolvers.insert(kind.into(), Arc::new(resolver));
    }

    /// Whether a resolver is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.resolvers.contains_key(kind)
    }

    /// Resolve a reference.
    ///
    /// Unknown type tags are a validation error; a known tag whose record is
    /// gone resolves to `None`.
    pub async fn resolve(&self, reference: &PolymorphicRef) -> AppResult<Option<T>> {
        let resolver = self.resolvers.get(&reference.kind).ok_or_else(|| {
            AppError::Validation(format!("No resolver for type: {}", reference.kind))
        })?;
        resolver.resolve(reference.id).await
    }
}

/// Resolves records of a [`Voter`] entity through `sea-orm`, mapping each
/// model with `map`.
pub struct VoterResolver<E, F> {
    db: Arc<DatabaseConnection>,
    map: F,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Voter, F> VoterResolver<E, F> {
    /// Create a resolver for `E`.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, map: F) -> Self {
        Self {
            db,
            map,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<E, F, T> EntityResolver<T> for VoterResolver<E, F>
where
    E: Voter,
    F: Fn(E::Model) -> T + Send + Sync,
    T: Send + 'static,
{
    async fn resolve(&self, id: i64) -> AppResult<Option<T>> {
        let model = E::find()
            .filter(E::voter_id_column().eq(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if model.is_none() {
            tracing::debug!(voter_type = E::VOTER_TYPE, id, "Voter record missing");
        }
        Ok(model.map(&self.map))
    }
}
