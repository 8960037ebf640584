use crate::{
    data::{
        student::{NewStudent, Student, StudentFilter},
        user::{AddUser, User},
    },
    error::RosterResult,
    store::{StudentStore, UserStore, Window},
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Students held in process memory. Ids are handed out from 1 and never reused.
#[derive(Debug, Default)]
pub struct MemoryStudentStore {
    inner: RwLock<MemoryStudents>,
}

#[derive(Debug, Default)]
struct MemoryStudents {
    last_id: i32,
    rows: BTreeMap<i32, Student>,
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn get(&self, id: i32) -> RosterResult<Option<Student>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn count(&self, filter: &StudentFilter) -> RosterResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.rows.values().filter(|s| filter.matches(s)).count() as u64)
    }

    async fn list(
        &self,
        filter: &StudentFilter,
        window: Option<Window>,
    ) -> RosterResult<Vec<Student>> {
        let inner = self.inner.read().await;
        //BTreeMap iterates in ascending key order, which is the id order
        let matching = inner.rows.values().filter(|s| filter.matches(s));

        Ok(match window {
            Some(Window { offset, limit }) => matching
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .cloned()
                .collect(),
            None => matching.cloned().collect(),
        })
    }

    async fn insert(&self, student: NewStudent) -> RosterResult<i32> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.rows.insert(id, student.with_id(id));
        Ok(id)
    }

    async fn update(&self, id: i32, student: NewStudent) -> RosterResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(match inner.rows.get_mut(&id) {
            Some(existing) => {
                *existing = student.with_id(id);
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: i32) -> RosterResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: Uuid) -> RosterResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> RosterResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn any_exist(&self) -> RosterResult<bool> {
        Ok(!self.users.read().await.is_empty())
    }

    async fn insert_first(&self, user: AddUser) -> RosterResult<Option<Uuid>> {
        let AddUser {
            email,
            bcrypt_hashed_password,
        } = user;

        let mut users = self.users.write().await;
        if !users.is_empty() {
            return Ok(None);
        }

        let id = Uuid::new_v4();
        users.insert(
            id,
            User {
                id,
                email,
                bcrypt_hashed_password: SecretString::from(bcrypt_hashed_password),
            },
        );
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::{Grade, tests::form};
    use secrecy::ExposeSecret;

    async fn seeded(names: &[(&str, &str)]) -> MemoryStudentStore {
        let store = MemoryStudentStore::default();
        for (first, last) in names {
            store
                .insert(form(first, last, "s@x.com", "7").validate().unwrap())
                .await
                .unwrap();
        }
        store
    }

    fn first_names(students: &[Student]) -> Vec<&str> {
        students.iter().map(|s| s.first_name.as_str()).collect()
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order_and_not_reused() {
        let store = seeded(&[("Ada", "Lovelace"), ("Alan", "Turing")]).await;
        assert!(store.delete(2).await.unwrap());

        let id = store
            .insert(form("Grace", "Hopper", "g@x.com", "7").validate().unwrap())
            .await
            .unwrap();
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn unfiltered_listing_is_ascending_by_id() {
        let store = seeded(&[("Zed", "Zulu"), ("Ada", "Lovelace"), ("Mia", "Moss")]).await;
        let all = store.list(&StudentFilter::default(), None).await.unwrap();

        assert_eq!(all.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(first_names(&all), vec!["Zed", "Ada", "Mia"]);
    }

    #[tokio::test]
    async fn name_search_matches_first_or_last_name() {
        let store = seeded(&[
            ("Ada", "Lovelace"),
            ("Alan", "Turing"),
            ("Grace", "Hopper"),
            ("Annie", "Easley"),
            ("Brian", "Kernighan"),
        ])
        .await;
        let filter = StudentFilter::new(Some("an"), None);

        let found = store.list(&filter, None).await.unwrap();
        assert_eq!(first_names(&found), vec!["Alan", "Annie", "Brian"]);
        assert_eq!(store.count(&filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn window_slices_the_filtered_rows() {
        let store = seeded(&[
            ("Ada", "Lovelace"),
            ("Alan", "Turing"),
            ("Grace", "Hopper"),
            ("Annie", "Easley"),
            ("Brian", "Kernighan"),
        ])
        .await;

        let page = store
            .list(
                &StudentFilter::default(),
                Some(Window {
                    offset: 2,
                    limit: 2,
                }),
            )
            .await
            .unwrap();
        assert_eq!(first_names(&page), vec!["Grace", "Annie"]);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = seeded(&[("Ada", "Lovelace")]).await;
        let mut changed = form("Ada", "Lovelace", "ada@x.com", "11").validate().unwrap();

        assert!(!store.update(9, changed.clone()).await.unwrap());
        changed.grade = Grade::new(12).unwrap();
        assert!(store.update(1, changed).await.unwrap());
        assert_eq!(store.get(1).await.unwrap().unwrap().grade.get(), 12);

        assert!(store.delete(1).await.unwrap());
        assert!(!store.delete(1).await.unwrap());
        assert!(store.get(1).await.unwrap().is_none());
    }

    fn account(email: &str, hash: &str) -> AddUser {
        AddUser {
            email: email.to_string(),
            bcrypt_hashed_password: hash.to_string(),
        }
    }

    #[tokio::test]
    async fn only_the_first_account_is_inserted() {
        let users = MemoryUserStore::default();
        assert!(!users.any_exist().await.unwrap());

        let first = users
            .insert_first(account("head@school.org", "a"))
            .await
            .unwrap()
            .unwrap();
        assert!(users.any_exist().await.unwrap());

        assert!(users.insert_first(account("head@school.org", "b")).await.unwrap().is_none());
        assert!(users.insert_first(account("deputy@school.org", "c")).await.unwrap().is_none());

        let stored = users.get_by_email("head@school.org").await.unwrap().unwrap();
        assert_eq!(stored.id, first);
        assert_eq!(stored.bcrypt_hashed_password.expose_secret(), "a");
        assert!(users.get_by_email("deputy@school.org").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn racing_first_accounts_leave_one_winner() {
        let users = MemoryUserStore::default();

        let (a, b) = tokio::join!(
            users.insert_first(account("head@school.org", "a")),
            users.insert_first(account("head@school.org", "b")),
        );

        assert_eq!(
            [a.unwrap(), b.unwrap()].iter().filter(|id| id.is_some()).count(),
            1
        );
    }
}
