//! Fast email-availability checks in front of the `users` table.
//!
//! The cuckoo filter answers "never registered" without a query; the moka
//! cache remembers addresses recently seen as taken. Neither is
//! authoritative: the unique key on `users.email` is.

use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::sync::RwLock;
use std::time::Duration;

const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;
const CACHE_CAPACITY: u64 = 200_000;
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[inline]
fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shared through `web::Data`; one instance per server.
pub struct EmailIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, ()>,
}

impl Default for EmailIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailIndex {
    pub fn new() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// False positives possible, false negatives not.
    pub fn might_exist(&self, email: &str) -> bool {
        let email = normalize(email);
        // a poisoned lock only means a writer panicked mid-add
        self.filter
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&email)
    }

    pub fn is_known_taken(&self, email: &str) -> bool {
        self.taken.contains_key(&normalize(email))
    }

    /// Records a freshly registered address in both structures.
    pub async fn mark_taken(&self, email: &str) {
        let email = normalize(email);
        self.filter
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .add(&email);
        self.taken.insert(email, ()).await;
    }

    /// Filter only; callers pass normalized addresses.
    pub fn add_to_filter(&self, emails: &[String]) {
        let mut filter = self.filter.write().unwrap_or_else(|e| e.into_inner());
        for email in emails {
            filter.add(email);
        }
    }

    async fn add_to_cache(&self, emails: Vec<String>) {
        let inserts: Vec<_> = emails
            .into_iter()
            .map(|email| self.taken.insert(email, ()))
            .collect();
        futures::future::join_all(inserts).await;
    }

    /// Loads every registered email into the filter, streaming in batches.
    pub async fn warmup_filter(&self, pool: &MySqlPool, batch_size: usize) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM users").fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            batch.push(normalize(&email));
            total += 1;

            if batch.len() == batch_size {
                self.add_to_filter(&batch);
                batch.clear();
            }
        }
        self.add_to_filter(&batch);

        log::info!("Email filter warmup complete: {} users", total);
        Ok(total)
    }

    /// Marks emails of users who logged in within the last `days` as taken.
    pub async fn warmup_recent(
        &self,
        pool: &MySqlPool,
        days: u32,
        batch_size: usize,
    ) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let mut stream = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT email
            FROM users
            WHERE last_login_at >= NOW() - INTERVAL ? DAY
            ORDER BY last_login_at DESC
            "#,
        )
        .bind(days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;

        while let Some(row) = stream.next().await {
            let (email,) = row?;
            batch.push(normalize(&email));
            total += 1;

            if batch.len() >= batch_size {
                self.add_to_cache(std::mem::take(&mut batch)).await;
            }
        }
        self.add_to_cache(batch).await;

        log::info!(
            "Email cache warmup complete: {} recent users (last {} days)",
            total,
            days
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn marked_email_is_seen_by_both_checks() {
        let index = EmailIndex::new();
        assert!(!index.might_exist("someone@keytrak.com"));
        assert!(!index.is_known_taken("someone@keytrak.com"));

        index.mark_taken("  SomeOne@Keytrak.com ").await;
        assert!(index.might_exist("someone@keytrak.com"));
        assert!(index.is_known_taken("SOMEONE@keytrak.com"));
    }

    #[actix_web::test]
    async fn instances_do_not_share_state() {
        let first = EmailIndex::new();
        let second = EmailIndex::new();

        first.mark_taken("shared@keytrak.com").await;
        assert!(first.is_known_taken("shared@keytrak.com"));
        assert!(!second.might_exist("shared@keytrak.com"));
        assert!(!second.is_known_taken("shared@keytrak.com"));
    }

    #[test]
    fn batch_add_reaches_filter() {
        let index = EmailIndex::new();
        index.add_to_filter(&[normalize("Batch@Keytrak.com")]);
        assert!(index.might_exist("batch@keytrak.com"));
    }
}
