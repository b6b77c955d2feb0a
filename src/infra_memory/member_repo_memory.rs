use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct MemoryMemberRepo {
    members: DashMap<MemberId, Member>,
    next_id: AtomicI64,
}

impl MemoryMemberRepo {
    pub fn new() -> Self {
        MemoryMemberRepo {
            members: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Seed a member under a fixed id.
    pub fn insert(&self, member: Member) {
        self.next_id.fetch_max(member.id.0 + 1, Ordering::SeqCst);
        self.members.insert(member.id, member);
    }

    fn find_first(&self, predicate: impl Fn(&Member) -> bool) -> Option<Member> {
        self.members
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

impl Default for MemoryMemberRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MemberRepo for MemoryMemberRepo {
    async fn create(&self, member: NewMember) -> Result<MemberId, AuthError> {
        if self.find_first(|m| m.email == member.email).is_some() {
            return Err(AuthError::DuplicatedEmail);
        }
        let id = MemberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.members.insert(
            id,
            Member {
                id,
                email: member.email,
                password_hash: member.password_hash,
                name: member.name,
                phone_number: member.phone_number,
                role: member.role,
                is_deleted: false,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, member_id: MemberId) -> Result<Option<Member>, AuthError> {
        Ok(self.members.get(&member_id).map(|m| m.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Member>, AuthError> {
        Ok(self.find_first(|m| m.email == email))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.find_first(|m| m.email == email).is_some())
    }

    async fn find_by_name_and_phone(
        &self,
        name: &str,
        phone_number: &str,
    ) -> Result<Option<Member>, AuthError> {
        Ok(self.find_first(|m| m.name == name && m.phone_number == phone_number))
    }

    async fn find_by_email_name_phone(
        &self,
        email: &str,
        name: &str,
        phone_number: &str,
    ) -> Result<Option<Member>, AuthError> {
        Ok(self.find_first(|m| {
            m.email == email && m.name == name && m.phone_number == phone_number
        }))
    }

    async fn save(&self, member: &Member) -> Result<(), AuthError> {
        match self.members.get_mut(&member.id) {
            Some(mut stored) => {
                *stored = member.clone();
                Ok(())
            }
            None => Err(AuthError::NotFoundIdentity),
        }
    }
}
