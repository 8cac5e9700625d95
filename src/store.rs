use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub credit_balance: i32,
    pub created_at: OffsetDateTime,
}

/// One purchase attempt. `payment` flips false -> true exactly once, at
/// settlement; `order_id` is set once the gateway order exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub amount: i64,
    pub credits: i32,
    pub payment: bool,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub paid_at: Option<OffsetDateTime>,
}

/// Outcome of a settlement attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Settlement {
    /// Flag flipped and balance credited in this call.
    Credited { balance: i32 },
    /// Transaction was already settled; no state changed.
    AlreadySettled { balance: i32 },
    TransactionMissing,
    UserMissing,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;

    async fn create_transaction(
        &self,
        user_id: Uuid,
        plan: &str,
        amount: i64,
        credits: i32,
    ) -> Result<CreditTransaction, ApiError>;

    async fn attach_order(&self, tx_id: Uuid, order_id: &str) -> Result<(), ApiError>;

    async fn find_transaction(&self, tx_id: Uuid) -> Result<Option<CreditTransaction>, ApiError>;

    /// Conditional decrement: subtracts one credit only while the balance is
    /// positive. Returns the new balance, or None when no credit was left.
    async fn consume_credit(&self, user_id: Uuid) -> Result<Option<i32>, ApiError>;

    /// Settles a transaction and credits the owner as one unit. The
    /// settlement-flag flip is the idempotency gate: a retry that finds the
    /// flag already set must not touch the balance.
    async fn settle_and_credit(
        &self,
        tx_id: Uuid,
        payment_id: &str,
    ) -> Result<Settlement, ApiError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx(e: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(ref db) = e {
        // 23505 = unique_violation; the only unique column is users.email
        if db.code().as_deref() == Some("23505") {
            return ApiError::Conflict("Email already registered".into());
        }
    }
    ApiError::Persistence(e.to_string())
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, credit_balance, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, credit_balance, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, credit_balance, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn create_transaction(
        &self,
        user_id: Uuid,
        plan: &str,
        amount: i64,
        credits: i32,
    ) -> Result<CreditTransaction, ApiError> {
        let tx = sqlx::query_as::<_, CreditTransaction>(
            r#"
            INSERT INTO credit_transactions (user_id, plan, amount, credits)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, plan, amount, credits, payment,
                      order_id, payment_id, created_at, paid_at
            "#,
        )
        .bind(user_id)
        .bind(plan)
        .bind(amount)
        .bind(credits)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(tx)
    }

    async fn attach_order(&self, tx_id: Uuid, order_id: &str) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE credit_transactions
            SET order_id = $2
            WHERE id = $1
            "#,
        )
        .bind(tx_id)
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn find_transaction(&self, tx_id: Uuid) -> Result<Option<CreditTransaction>, ApiError> {
        let tx = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT id, user_id, plan, amount, credits, payment,
                   order_id, payment_id, created_at, paid_at
            FROM credit_transactions
            WHERE id = $1
            "#,
        )
        .bind(tx_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(tx)
    }

    async fn consume_credit(&self, user_id: Uuid) -> Result<Option<i32>, ApiError> {
        let balance = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET credit_balance = credit_balance - 1
            WHERE id = $1 AND credit_balance > 0
            RETURNING credit_balance
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(balance)
    }

    async fn settle_and_credit(
        &self,
        tx_id: Uuid,
        payment_id: &str,
    ) -> Result<Settlement, ApiError> {
        let mut txn = self.pool.begin().await.map_err(map_sqlx)?;

        // The conditional update is the gate: concurrent confirmations race
        // on this row lock and only one sees payment = FALSE.
        let claimed = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            UPDATE credit_transactions
            SET payment = TRUE, payment_id = $2, paid_at = now()
            WHERE id = $1 AND payment = FALSE
            RETURNING user_id, credits
            "#,
        )
        .bind(tx_id)
        .bind(payment_id)
        .fetch_optional(&mut *txn)
        .await
        .map_err(map_sqlx)?;

        let Some((user_id, credits)) = claimed else {
            txn.rollback().await.map_err(map_sqlx)?;
            let existing = self.find_transaction(tx_id).await?;
            return match existing {
                Some(tx) => {
                    let balance = self
                        .find_user_by_id(tx.user_id)
                        .await?
                        .map(|u| u.credit_balance)
                        .unwrap_or(0);
                    Ok(Settlement::AlreadySettled { balance })
                }
                None => Ok(Settlement::TransactionMissing),
            };
        };

        let balance = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET credit_balance = credit_balance + $2
            WHERE id = $1
            RETURNING credit_balance
            "#,
        )
        .bind(user_id)
        .bind(credits)
        .fetch_optional(&mut *txn)
        .await
        .map_err(map_sqlx)?;

        let Some(balance) = balance else {
            txn.rollback().await.map_err(map_sqlx)?;
            return Ok(Settlement::UserMissing);
        };

        txn.commit().await.map_err(map_sqlx)?;
        Ok(Settlement::Credited { balance })
    }
}

#[cfg(test)]
pub mod mem {
    //! In-memory Store used by service tests, mirroring the Postgres
    //! semantics (unique email, conditional decrement, settle-once gate).

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Inner {
        users: HashMap<Uuid, User>,
        transactions: HashMap<Uuid, CreditTransaction>,
    }

    #[derive(Default)]
    pub struct MemStore {
        inner: Mutex<Inner>,
    }

    impl MemStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn balance_of(&self, user_id: Uuid) -> Option<i32> {
            let inner = self.inner.lock().unwrap();
            inner.users.get(&user_id).map(|u| u.credit_balance)
        }

        pub fn user_count(&self) -> usize {
            self.inner.lock().unwrap().users.len()
        }

        pub fn set_balance(&self, user_id: Uuid, balance: i32) {
            let mut inner = self.inner.lock().unwrap();
            if let Some(u) = inner.users.get_mut(&user_id) {
                u.credit_balance = balance;
            }
        }
    }

    #[async_trait]
    impl Store for MemStore {
        async fn create_user(
            &self,
            name: &str,
            email: &str,
            password_hash: &str,
        ) -> Result<User, ApiError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.users.values().any(|u| u.email == email) {
                return Err(ApiError::Conflict("Email already registered".into()));
            }
            let user = User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                credit_balance: 0,
                created_at: OffsetDateTime::now_utc(),
            };
            inner.users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.users.values().find(|u| u.email == email).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.users.get(&id).cloned())
        }

        async fn create_transaction(
            &self,
            user_id: Uuid,
            plan: &str,
            amount: i64,
            credits: i32,
        ) -> Result<CreditTransaction, ApiError> {
            let mut inner = self.inner.lock().unwrap();
            let tx = CreditTransaction {
                id: Uuid::new_v4(),
                user_id,
                plan: plan.to_string(),
                amount,
                credits,
                payment: false,
                order_id: None,
                payment_id: None,
                created_at: OffsetDateTime::now_utc(),
                paid_at: None,
            };
            inner.transactions.insert(tx.id, tx.clone());
            Ok(tx)
        }

        async fn attach_order(&self, tx_id: Uuid, order_id: &str) -> Result<(), ApiError> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(tx) = inner.transactions.get_mut(&tx_id) {
                tx.order_id = Some(order_id.to_string());
            }
            Ok(())
        }

        async fn find_transaction(
            &self,
            tx_id: Uuid,
        ) -> Result<Option<CreditTransaction>, ApiError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.transactions.get(&tx_id).cloned())
        }

        async fn consume_credit(&self, user_id: Uuid) -> Result<Option<i32>, ApiError> {
            let mut inner = self.inner.lock().unwrap();
            match inner.users.get_mut(&user_id) {
                Some(u) if u.credit_balance > 0 => {
                    u.credit_balance -= 1;
                    Ok(Some(u.credit_balance))
                }
                _ => Ok(None),
            }
        }

        async fn settle_and_credit(
            &self,
            tx_id: Uuid,
            payment_id: &str,
        ) -> Result<Settlement, ApiError> {
            let mut inner = self.inner.lock().unwrap();
            let Some(tx) = inner.transactions.get(&tx_id).cloned() else {
                return Ok(Settlement::TransactionMissing);
            };
            if tx.payment {
                let balance = inner
                    .users
                    .get(&tx.user_id)
                    .map(|u| u.credit_balance)
                    .unwrap_or(0);
                return Ok(Settlement::AlreadySettled { balance });
            }
            let Some(user) = inner.users.get_mut(&tx.user_id) else {
                return Ok(Settlement::UserMissing);
            };
            user.credit_balance += tx.credits;
            let balance = user.credit_balance;
            let tx = inner.transactions.get_mut(&tx_id).unwrap();
            tx.payment = true;
            tx.payment_id = Some(payment_id.to_string());
            tx.paid_at = Some(OffsetDateTime::now_utc());
            Ok(Settlement::Credited { balance })
        }
    }
}
