use crate::{
    db::{Db, UpdatePatch},
    domain::{Activity, Member},
    error::{Error, ErrorOrigin},
    repo::{Repository, decode},
};
use tracing::debug;

///
/// ActivityService
///
/// Reservations. A member's `activity_list` and each activity's remaining
/// `max_capacity` always move together, in one transaction, so the sum of
/// open places and held reservations for an activity never changes.
///

#[derive(Clone)]
pub struct ActivityService {
    db: Db,
    members: Repository<Member>,
}

impl ActivityService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            members: Repository::new(db.clone()),
            db,
        }
    }

    /// Take one place in `activity_id` for `member_id`.
    pub async fn reserve(&self, member_id: &str, activity_id: &str) -> Result<(), Error> {
        self.db
            .run_transaction(move |tx| async move {
                let member: Member = decode(tx.get::<Member>(member_id).await?)?;
                let activity: Activity = decode(tx.get::<Activity>(activity_id).await?)?;

                if member.holds(activity_id) {
                    return Err(Error::conflict(
                        ErrorOrigin::Domain,
                        format!("member {member_id} already holds activity {activity_id}"),
                    ));
                }
                if !activity.has_room() {
                    return Err(Error::insufficient_resource(format!(
                        "activity {activity_id} has no places left"
                    )));
                }

                let mut held = member.activity_list;
                held.push(activity_id.to_string());

                tx.update::<Activity>(
                    activity_id,
                    &UpdatePatch::new().set(Activity::CAPACITY, activity.max_capacity - 1),
                )
                .await?;
                tx.update::<Member>(member_id, &UpdatePatch::new().set(Member::ACTIVITY_LIST, held))
                    .await?;

                Ok::<_, Error>(())
            })
            .await?;
        debug!(member = member_id, activity = activity_id, "reserved");

        Ok(())
    }

    /// Give back the place `member_id` holds in `activity_id`.
    pub async fn release(&self, member_id: &str, activity_id: &str) -> Result<(), Error> {
        self.db
            .run_transaction(move |tx| async move {
                let member: Member = decode(tx.get::<Member>(member_id).await?)?;
                let activity: Activity = decode(tx.get::<Activity>(activity_id).await?)?;

                if !member.holds(activity_id) {
                    return Err(Error::conflict(
                        ErrorOrigin::Domain,
                        format!("member {member_id} does not hold activity {activity_id}"),
                    ));
                }

                let held: Vec<String> = member
                    .activity_list
                    .into_iter()
                    .filter(|id| id != activity_id)
                    .collect();

                tx.update::<Activity>(
                    activity_id,
                    &UpdatePatch::new().set(Activity::CAPACITY, activity.max_capacity + 1),
                )
                .await?;
                tx.update::<Member>(member_id, &UpdatePatch::new().set(Member::ACTIVITY_LIST, held))
                    .await?;

                Ok::<_, Error>(())
            })
            .await?;
        debug!(member = member_id, activity = activity_id, "released");

        Ok(())
    }

    /// Bring a member's reservations in line with `desired`: reserve what
    /// is new, release what is gone. Each change is its own transaction;
    /// the first failure stops the sync and names the activity involved.
    pub async fn sync_reservations(
        &self,
        member_id: &str,
        desired: &[String],
    ) -> Result<Member, Error> {
        let member = self.members.read(member_id).await?;
        let (added, removed) = reservation_diff(&member.activity_list, desired);
        debug!(
            member = member_id,
            added = added.len(),
            removed = removed.len(),
            "syncing reservations"
        );

        for id in &added {
            self.reserve(member_id, id)
                .await
                .map_err(|err| err.with_context(format!("reserve {id}")))?;
        }
        for id in &removed {
            self.release(member_id, id)
                .await
                .map_err(|err| err.with_context(format!("release {id}")))?;
        }

        self.members.read(member_id).await
    }
}

// (to reserve, to release), each in first-seen order without repeats.
fn reservation_diff(current: &[String], desired: &[String]) -> (Vec<String>, Vec<String>) {
    let mut added: Vec<String> = Vec::new();
    for id in desired {
        if !current.contains(id) && !added.contains(id) {
            added.push(id.clone());
        }
    }

    let mut removed: Vec<String> = Vec::new();
    for id in current {
        if !desired.contains(id) && !removed.contains(id) {
            removed.push(id.clone());
        }
    }

    (added, removed)
}
