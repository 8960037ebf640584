use crate::{
    data::{
        student::{NewStudent, Student, StudentFilter},
        user::{AddUser, User},
    },
    error::{GetDatabaseConnectionSnafu, MakeQuerySnafu, RosterResult},
    store::{StudentStore, UserStore, Window},
};
use async_trait::async_trait;
use secrecy::SecretString;
use snafu::ResultExt;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

const FIRST_USER_LOCK: i64 = 0x526f_7374_6572;

const STUDENT_COLUMNS: &str =
    "SELECT id, first_name, last_name, email, date_of_birth, enrollment_date, grade FROM public.students";

#[derive(Debug, Clone)]
pub struct PostgresStudentStore {
    pool: Pool<Postgres>,
}

impl PostgresStudentStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// `%`, `_` and `\` are wildcards/escapes to `ILIKE`, so a search for `50%` must not match everything.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter) {
    builder.push(" WHERE TRUE");

    if let Some(needle) = filter.name_contains() {
        let pattern = format!("%{}%", escape_like(needle));
        builder
            .push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(grade) = filter.grade {
        builder.push(" AND grade = ").push_bind(grade.get());
    }
}

fn to_sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl StudentStore for PostgresStudentStore {
    async fn get(&self, id: i32) -> RosterResult<Option<Student>> {
        let query = format!("{STUDENT_COLUMNS} WHERE id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn count(&self, filter: &StudentFilter) -> RosterResult<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM public.students");
        push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)?;
        Ok(count.unsigned_abs())
    }

    async fn list(
        &self,
        filter: &StudentFilter,
        window: Option<Window>,
    ) -> RosterResult<Vec<Student>> {
        let mut builder = QueryBuilder::new(STUDENT_COLUMNS);
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY id ASC");

        if let Some(Window { offset, limit }) = window {
            builder
                .push(" LIMIT ")
                .push_bind(to_sql_int(limit))
                .push(" OFFSET ")
                .push_bind(to_sql_int(offset));
        }

        builder
            .build_query_as::<Student>()
            .fetch_all(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn insert(&self, student: NewStudent) -> RosterResult<i32> {
        let NewStudent {
            first_name,
            last_name,
            email,
            date_of_birth,
            enrollment_date,
            grade,
        } = student;

        sqlx::query_scalar("INSERT INTO public.students (first_name, last_name, email, date_of_birth, enrollment_date, grade) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id")
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(date_of_birth)
            .bind(enrollment_date)
            .bind(grade)
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn update(&self, id: i32, student: NewStudent) -> RosterResult<bool> {
        let NewStudent {
            first_name,
            last_name,
            email,
            date_of_birth,
            enrollment_date,
            grade,
        } = student;

        let result = sqlx::query("UPDATE public.students SET first_name = $2, last_name = $3, email = $4, date_of_birth = $5, enrollment_date = $6, grade = $7 WHERE id = $1")
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .bind(email)
            .bind(date_of_birth)
            .bind(enrollment_date)
            .bind(grade)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i32) -> RosterResult<bool> {
        let result = sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(MakeQuerySnafu)?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Pool<Postgres>,
}

impl PostgresUserStore {
    pub const fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    bcrypt_hashed_password: String,
}

impl From<UserRow> for User {
    fn from(
        UserRow {
            id,
            email,
            bcrypt_hashed_password,
        }: UserRow,
    ) -> Self {
        Self {
            id,
            email,
            bcrypt_hashed_password: SecretString::from(bcrypt_hashed_password),
        }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn get_by_id(&self, id: Uuid) -> RosterResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, email, bcrypt_hashed_password FROM public.users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> RosterResult<Option<User>> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, email, bcrypt_hashed_password FROM public.users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context(MakeQuerySnafu)?
        .map(User::from))
    }

    async fn any_exist(&self) -> RosterResult<bool> {
        sqlx::query_scalar("SELECT exists(SELECT 1 FROM public.users)")
            .fetch_one(&self.pool)
            .await
            .context(MakeQuerySnafu)
    }

    async fn insert_first(&self, user: AddUser) -> RosterResult<Option<Uuid>> {
        let AddUser {
            email,
            bcrypt_hashed_password,
        } = user;

        let mut transaction = self
            .pool
            .begin()
            .await
            .context(GetDatabaseConnectionSnafu)?;

        //held until commit, so only one first-account insert runs at a time
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(FIRST_USER_LOCK)
            .execute(&mut *transaction)
            .await
            .context(MakeQuerySnafu)?;

        let id = sqlx::query_scalar(
            "INSERT INTO public.users (email, bcrypt_hashed_password) SELECT $1, $2 WHERE NOT EXISTS (SELECT 1 FROM public.users) RETURNING id",
        )
        .bind(email)
        .bind(bcrypt_hashed_password)
        .fetch_optional(&mut *transaction)
        .await
        .context(MakeQuerySnafu)?;

        transaction.commit().await.context(MakeQuerySnafu)?;

        Ok(id)
    }
}
