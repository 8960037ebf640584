use crate::{
    data::{
        student::{NewStudent, Student, StudentFilter},
        user::{AddUser, User},
    },
    error::RosterResult,
};
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

/// A contiguous run of rows, counted in the store's ascending-id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// Persistence boundary for students.
///
/// Every listing comes back ordered by ascending `id`, which is what keeps pagination stable
/// between requests. Writes do no locking of their own, so concurrent edits to the same
/// student resolve as last-write-wins.
#[async_trait]
pub trait StudentStore: Debug + Send + Sync {
    async fn get(&self, id: i32) -> RosterResult<Option<Student>>;
    async fn count(&self, filter: &StudentFilter) -> RosterResult<u64>;
    /// With no window, every matching student is returned.
    async fn list(
        &self,
        filter: &StudentFilter,
        window: Option<Window>,
    ) -> RosterResult<Vec<Student>>;
    async fn insert(&self, student: NewStudent) -> RosterResult<i32>;
    /// Returns `false` if there was no student with that id.
    async fn update(&self, id: i32, student: NewStudent) -> RosterResult<bool>;
    /// Returns `false` if there was no student with that id.
    async fn delete(&self, id: i32) -> RosterResult<bool>;
}

#[async_trait]
pub trait UserStore: Debug + Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> RosterResult<Option<User>>;
    async fn get_by_email(&self, email: &str) -> RosterResult<Option<User>>;
    async fn any_exist(&self) -> RosterResult<bool>;
    /// Inserts the very first account. Returns `None` without writing anything if any user already
    /// exists, including one added by a concurrent call.
    async fn insert_first(&self, user: AddUser) -> RosterResult<Option<Uuid>>;
}

pub type StudentStoreHandle = Arc<dyn StudentStore>;
pub type UserStoreHandle = Arc<dyn UserStore>;
