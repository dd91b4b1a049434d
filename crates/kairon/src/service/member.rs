use crate::{
    db::{Db, UpdatePatch, query::QueryOptions},
    domain::{Member, Membership},
    error::Error,
    repo::Repository,
};

///
/// MemberService
///
/// Member records with their cross-entity rules: the referenced membership
/// must exist, and `activity_list` is left to [`ActivityService`](super::ActivityService).
///

#[derive(Clone)]
pub struct MemberService {
    members: Repository<Member>,
    memberships: Repository<Membership>,
}

impl MemberService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            members: Repository::new(db.clone()),
            memberships: Repository::new(db),
        }
    }

    pub async fn create(&self, member: &Member) -> Result<Member, Error> {
        if !member.activity_list.is_empty() {
            return Err(Error::invalid_input(
                "new members start without reservations",
            ));
        }
        self.require_membership(&member.membership_id).await?;

        self.members.create(member).await
    }

    pub async fn read(&self, id: &str) -> Result<Member, Error> {
        self.members.read(id).await
    }

    pub async fn list(&self, opts: &QueryOptions) -> Result<Vec<Member>, Error> {
        self.members.list(opts).await
    }

    pub async fn update(&self, id: &str, patch: &UpdatePatch) -> Result<Member, Error> {
        let touches_reservations = patch.iter().any(|(path, _)| {
            path == Member::ACTIVITY_LIST
                || path.starts_with(&format!("{}.", Member::ACTIVITY_LIST))
        });
        if touches_reservations {
            return Err(Error::invalid_input(
                "activity_list changes go through reservations",
            ));
        }

        if let Some(value) = patch.get(Member::MEMBERSHIP_ID) {
            let membership_id = value
                .as_text()
                .ok_or_else(|| Error::invalid_input("membership_id must be text"))?;
            self.require_membership(membership_id).await?;
        }

        self.members.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.members.delete(id).await
    }

    async fn require_membership(&self, id: &str) -> Result<(), Error> {
        self.memberships
            .read(id)
            .await
            .map(|_| ())
            .map_err(|err| err.with_context(format!("membership {id}")))
    }
}
