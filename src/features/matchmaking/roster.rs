//! Collecting the members who take part in a round
//!
//! The gateway cache only holds part of the member list in large guilds, so the roster
//! is always read page by page from the member-list endpoint.

use anyhow::Result;
use serenity::model::guild::Member;
use serenity::model::id::RoleId;
use std::future::Future;

/// Largest page the member-list endpoint returns
pub const MEMBER_PAGE_SIZE: u64 = 1000;

/// What the roster needs to know about a member
pub trait RosterMember {
    fn member_id(&self) -> u64;
    fn is_bot(&self) -> bool;
    fn holds_role(&self, role_id: u64) -> bool;
}

impl RosterMember for Member {
    fn member_id(&self) -> u64 {
        self.user.id.0
    }

    fn is_bot(&self) -> bool {
        self.user.bot
    }

    fn holds_role(&self, role_id: u64) -> bool {
        self.roles.contains(&RoleId(role_id))
    }
}

/// Every non-bot member holding `role_id`.
///
/// `fetch_page(after, limit)` returns up to `limit` members with ids above `after`, in id
/// order. Paging stops at the first short page.
pub async fn role_holders<M, F, Fut>(role_id: u64, page_size: u64, mut fetch_page: F) -> Result<Vec<M>>
where
    M: RosterMember,
    F: FnMut(Option<u64>, u64) -> Fut,
    Fut: Future<Output = Result<Vec<M>>>,
{
    let mut holders = Vec::new();
    let mut after = None;
    loop {
        let page = fetch_page(after, page_size).await?;
        let full_page = page.len() as u64 >= page_size;
        let last_id = page.iter().map(RosterMember::member_id).max();

        holders.extend(
            page.into_iter()
                .filter(|member| !member.is_bot() && member.holds_role(role_id)),
        );

        match last_id {
            Some(id) if full_page => after = Some(id),
            _ => break,
        }
    }
    Ok(holders)
}
