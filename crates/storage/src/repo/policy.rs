use crate::{
    models::{SqlIdentity, SqlWord},
    repo::meta::put_meta,
    Db,
};
use domain::{Identity, MatchPolicy, PermissionFlags, PolicySnapshot, TriggerWords};
use tracing::warn;

const KIND_MANAGER: &str = "manager";
const KIND_BLOCKED: &str = "blocked";
const KIND_PUSH: &str = "push";
const KIND_PULL: &str = "pull";

const KEY_SAVED: &str = "policy_saved";
const KEY_PUSH_MANAGER_ONLY: &str = "push_manager_only";
const KEY_PULL_MANAGER_ONLY: &str = "pull_manager_only";
const KEY_MATCH_POLICY: &str = "match_policy";

impl Db {
    /// `None` until a policy has been saved once; callers fall back to defaults.
    pub async fn load_policy(&self) -> anyhow::Result<Option<PolicySnapshot>> {
        if self.get_meta(KEY_SAVED).await?.is_none() {
            return Ok(None);
        }

        let identities = sqlx::query_as::<_, SqlIdentity>(
            "SELECT kind, platform, user_id, name FROM identities ORDER BY kind, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut managers = Vec::new();
        let mut blocked_users = Vec::new();
        for row in identities {
            let kind = row.kind.clone();
            let identity = Identity::try_from(row)?;
            match kind.as_str() {
                KIND_MANAGER => managers.push(identity),
                KIND_BLOCKED => blocked_users.push(identity),
                other => warn!("Skipping identity with unknown kind: {}", other),
            }
        }

        let rows = sqlx::query_as::<_, SqlWord>(
            "SELECT kind, word FROM trigger_words ORDER BY kind, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut words = TriggerWords {
            push_words: Vec::new(),
            pull_words: Vec::new(),
        };
        for row in rows {
            match row.kind.as_str() {
                KIND_PUSH => words.push_words.push(row.word),
                KIND_PULL => words.pull_words.push(row.word),
                other => warn!("Skipping trigger word with unknown kind: {}", other),
            }
        }

        let flags = PermissionFlags {
            push_manager_only: self.get_meta(KEY_PUSH_MANAGER_ONLY).await?.as_deref() == Some("true"),
            pull_manager_only: self.get_meta(KEY_PULL_MANAGER_ONLY).await?.as_deref() == Some("true"),
        };

        let match_policy = match self.get_meta(KEY_MATCH_POLICY).await? {
            Some(raw) => raw.parse::<MatchPolicy>().unwrap_or_else(|e| {
                warn!("{}, using default", e);
                MatchPolicy::default()
            }),
            None => MatchPolicy::default(),
        };

        Ok(Some(PolicySnapshot {
            managers,
            blocked_users,
            flags,
            words,
            match_policy,
        }))
    }

    pub async fn save_policy(&self, policy: &PolicySnapshot) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM identities").execute(&mut *tx).await?;
        let identities = policy
            .managers
            .iter()
            .enumerate()
            .map(|(i, id)| (KIND_MANAGER, i, id))
            .chain(
                policy
                    .blocked_users
                    .iter()
                    .enumerate()
                    .map(|(i, id)| (KIND_BLOCKED, i, id)),
            );
        for (kind, position, identity) in identities {
            sqlx::query(
                "INSERT INTO identities (kind, position, platform, user_id, name) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(kind)
            .bind(position as i64)
            .bind(identity.platform.as_str())
            .bind(&identity.id)
            .bind(&identity.name)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM trigger_words").execute(&mut *tx).await?;
        let words = policy
            .words
            .push_words
            .iter()
            .enumerate()
            .map(|(i, w)| (KIND_PUSH, i, w))
            .chain(
                policy
                    .words
                    .pull_words
                    .iter()
                    .enumerate()
                    .map(|(i, w)| (KIND_PULL, i, w)),
            );
        for (kind, position, word) in words {
            sqlx::query("INSERT INTO trigger_words (kind, position, word) VALUES (?, ?, ?)")
                .bind(kind)
                .bind(position as i64)
                .bind(word)
                .execute(&mut *tx)
                .await?;
        }

        put_meta(
            &mut *tx,
            KEY_PUSH_MANAGER_ONLY,
            &policy.flags.push_manager_only.to_string(),
        )
        .await?;
        put_meta(
            &mut *tx,
            KEY_PULL_MANAGER_ONLY,
            &policy.flags.pull_manager_only.to_string(),
        )
        .await?;
        put_meta(&mut *tx, KEY_MATCH_POLICY, policy.match_policy.as_str()).await?;
        put_meta(&mut *tx, KEY_SAVED, "1").await?;

        tx.commit().await?;
        Ok(())
    }
}
