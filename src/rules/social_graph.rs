// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Follow and friend-request protocol.
//!
//! Following is asymmetric and independent of friendship. For the friend
//! relation a pair of users is always in exactly one of: unconnected, one
//! pending request (in one direction only), or mutual friends. Every action
//! edits both documents so that:
//!
//! - `a ∈ b.friends` ⇔ `b ∈ a.friends`
//! - `a ∈ b.friend_requests` ⇔ `b ∈ a.sent_friend_requests`
//! - friends never also appear in each other's pending lists

use serde::Serialize;

use crate::error::RuleViolation;
use crate::models::User;

/// An edge mutation requested by `actor` against `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphAction {
    Follow,
    Unfollow,
    /// Actor asks target to be friends.
    SendFriendRequest,
    /// Actor accepts the request target sent.
    AcceptFriendRequest,
    /// Actor rejects the request target sent.
    DeclineFriendRequest,
    /// Actor withdraws the request they sent to target.
    CancelFriendRequest,
    RemoveFriend,
}

/// What an accepted action did to the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphOutcome {
    Followed,
    Unfollowed,
    RequestSent,
    /// A request crossed one already pending in the other direction.
    BecameFriends,
    RequestDeclined,
    RequestCancelled,
    FriendRemoved,
}

impl GraphOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            GraphOutcome::Followed => "User followed successfully",
            GraphOutcome::Unfollowed => "User unfollowed successfully",
            GraphOutcome::RequestSent => "Friend request sent",
            GraphOutcome::BecameFriends => "Friend request accepted",
            GraphOutcome::RequestDeclined => "Friend request declined",
            GraphOutcome::RequestCancelled => "Friend request cancelled",
            GraphOutcome::FriendRemoved => "Friend removed",
        }
    }
}

impl GraphAction {
    /// The failure reported when actor and target are the same user.
    pub fn self_target_violation(&self) -> RuleViolation {
        match self {
            GraphAction::Follow | GraphAction::Unfollow => RuleViolation::CannotFollowSelf,
            GraphAction::SendFriendRequest => RuleViolation::CannotRequestSelf,
            GraphAction::AcceptFriendRequest
            | GraphAction::DeclineFriendRequest
            | GraphAction::CancelFriendRequest => RuleViolation::NoSuchRequest,
            GraphAction::RemoveFriend => RuleViolation::NotFriends,
        }
    }

    /// Check preconditions against both freshly loaded documents and edit them.
    ///
    /// On error neither document is modified.
    pub fn apply(&self, actor: &mut User, target: &mut User) -> Result<GraphOutcome, RuleViolation> {
        if actor.id == target.id {
            return Err(self.self_target_violation());
        }
        match self {
            GraphAction::Follow => follow(actor, target),
            GraphAction::Unfollow => unfollow(actor, target),
            GraphAction::SendFriendRequest => send_friend_request(actor, target),
            GraphAction::AcceptFriendRequest => accept_friend_request(actor, target),
            GraphAction::DeclineFriendRequest => decline_friend_request(actor, target),
            GraphAction::CancelFriendRequest => cancel_friend_request(actor, target),
            GraphAction::RemoveFriend => remove_friend(actor, target),
        }
    }
}

fn follow(actor: &mut User, target: &mut User) -> Result<GraphOutcome, RuleViolation> {
    if actor.following.contains(&target.id) {
        return Err(RuleViolation::AlreadyFollowing);
    }
    actor.following.insert(target.id.clone());
    target.followers.insert(actor.id.clone());
    Ok(GraphOutcome::Followed)
}

fn unfollow(actor: &mut User, target: &mut User) -> Result<GraphOutcome, RuleViolation> {
    if !actor.following.contains(&target.id) {
        return Err(RuleViolation::NotFollowing);
    }
    actor.following.remove(&target.id);
    target.followers.remove(&actor.id);
    Ok(GraphOutcome::Unfollowed)
}

fn send_friend_request(
    sender: &mut User,
    recipient: &mut User,
) -> Result<GraphOutcome, RuleViolation> {
    if recipient.friends.contains(&sender.id) {
        return Err(RuleViolation::AlreadyFriends);
    }
    if recipient.friend_requests.contains(&sender.id) {
        return Err(RuleViolation::AlreadyRequested);
    }
    if sender.friend_requests.contains(&recipient.id) {
        // The recipient already asked us: treat this as accepting.
        return accept_friend_request(sender, recipient);
    }
    recipient.friend_requests.insert(sender.id.clone());
    sender.sent_friend_requests.insert(recipient.id.clone());
    Ok(GraphOutcome::RequestSent)
}

fn accept_friend_request(
    recipient: &mut User,
    requester: &mut User,
) -> Result<GraphOutcome, RuleViolation> {
    if !recipient.friend_requests.contains(&requester.id) {
        return Err(RuleViolation::NoSuchRequest);
    }
    clear_pending(recipient, requester);
    recipient.friends.insert(requester.id.clone());
    requester.friends.insert(recipient.id.clone());
    Ok(GraphOutcome::BecameFriends)
}

fn decline_friend_request(
    recipient: &mut User,
    requester: &mut User,
) -> Result<GraphOutcome, RuleViolation> {
    if !recipient.friend_requests.contains(&requester.id) {
        return Err(RuleViolation::NoSuchRequest);
    }
    clear_pending(recipient, requester);
    Ok(GraphOutcome::RequestDeclined)
}

fn cancel_friend_request(
    sender: &mut User,
    recipient: &mut User,
) -> Result<GraphOutcome, RuleViolation> {
    if !sender.sent_friend_requests.contains(&recipient.id) {
        return Err(RuleViolation::NoSuchRequest);
    }
    clear_pending(recipient, sender);
    Ok(GraphOutcome::RequestCancelled)
}

fn remove_friend(actor: &mut User, friend: &mut User) -> Result<GraphOutcome, RuleViolation> {
    if !actor.friends.contains(&friend.id) && !friend.friends.contains(&actor.id) {
        return Err(RuleViolation::NotFriends);
    }
    actor.friends.remove(&friend.id);
    friend.friends.remove(&actor.id);
    Ok(GraphOutcome::FriendRemoved)
}

/// Drop a pending `requester → recipient` request from both sides.
fn clear_pending(recipient: &mut User, requester: &mut User) {
    recipient.friend_requests.remove(&requester.id);
    requester.sent_friend_requests.remove(&recipient.id);
}

/// Whether the friend-related edges between `a` and `b` satisfy the pair invariants.
pub fn pair_is_consistent(a: &User, b: &User) -> bool {
    let friends_symmetric = a.friends.contains(&b.id) == b.friends.contains(&a.id);
    let a_to_b_mirrored =
        b.friend_requests.contains(&a.id) == a.sent_friend_requests.contains(&b.id);
    let b_to_a_mirrored =
        a.friend_requests.contains(&b.id) == b.sent_friend_requests.contains(&a.id);
    let pending_one_way =
        !(b.friend_requests.contains(&a.id) && a.friend_requests.contains(&b.id));
    let friends_not_pending = !a.friends.contains(&b.id)
        || !(a.friend_requests.contains(&b.id) || a.sent_friend_requests.contains(&b.id));
    let follow_mirrored = a.following.contains(&b.id) == b.followers.contains(&a.id)
        && b.following.contains(&a.id) == a.followers.contains(&b.id);

    friends_symmetric
        && a_to_b_mirrored
        && b_to_a_mirrored
        && pending_one_way
        && friends_not_pending
        && follow_mirrored
}
