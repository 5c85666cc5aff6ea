use crate::core::{BlockStore, UserDirectory};
use crate::error::RecommendError;
use crate::models::{BlockRecord, UserRecord};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// In-process user directory, used for local runs and tests
///
/// Skill matching is exact, like an `array-contains-any` query.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }

    pub async fn insert(&self, user: UserRecord) {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id().is_some() && u.id() == user.id()) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, RecommendError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id() == Some(id)).cloned())
    }

    async fn query_alumni_by_skills(
        &self,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<UserRecord>, RecommendError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.is_alumni() && u.skills.iter().any(|s| tags.contains(s)))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_alumni(&self) -> Result<Vec<UserRecord>, RecommendError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| u.is_alumni()).cloned().collect())
    }
}

/// In-process append-only block store
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    blocks: RwLock<Vec<BlockRecord>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored record, duplicates included
    pub async fn records(&self) -> Vec<BlockRecord> {
        self.blocks.read().await.clone()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn get_blocks(&self, student_id: &str) -> Result<HashSet<String>, RecommendError> {
        let blocks = self.blocks.read().await;
        Ok(blocks
            .iter()
            .filter(|b| b.student_id == student_id)
            .map(|b| b.alumni_id.clone())
            .collect())
    }

    async fn add_block(&self, student_id: &str, alumni_id: &str) -> Result<(), RecommendError> {
        self.blocks.write().await.push(BlockRecord {
            student_id: student_id.to_string(),
            alumni_id: alumni_id.to_string(),
            blocked_at: chrono::Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alumni(id: &str, skills: &[&str]) -> UserRecord {
        UserRecord {
            id: Some(id.to_string()),
            role: "alumni".to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_skill_query_respects_limit_and_role() {
        let mut student = alumni("stu1", &["rust"]);
        student.role = "student".to_string();
        let directory = InMemoryDirectory::new(vec![
            student,
            alumni("a", &["rust"]),
            alumni("b", &["go", "rust"]),
            alumni("c", &["java"]),
        ]);

        let found = directory
            .query_alumni_by_skills(&["rust".to_string()], 1)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), Some("a"));

        assert_eq!(directory.list_alumni().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_blocks_accumulate() {
        let store = InMemoryBlockStore::new();
        store.add_block("stu1", "a").await.unwrap();
        store.add_block("stu1", "a").await.unwrap();
        store.add_block("stu2", "b").await.unwrap();

        assert_eq!(store.records().await.len(), 3);
        assert_eq!(store.get_blocks("stu1").await.unwrap().len(), 1);
    }
}
