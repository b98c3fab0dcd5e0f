//! Permission checks. Each takes the acting [`ActorContext`] explicitly and
//! runs before any state is touched.

use crate::domain::{ActorContext, Guide, Post};
use jaboway_errors::AppError;

/// Blocked accounts may not mutate anything, unless acting in admin mode.
pub fn ensure_not_blocked(actor: &ActorContext) -> Result<(), AppError> {
    if actor.is_blocked() && !actor.is_admin {
        return Err(AppError::AccountBlocked);
    }
    Ok(())
}

/// Creating threads and commenting need a signed-in account or admin mode.
pub fn require_member(actor: &ActorContext, action: &str) -> Result<(), AppError> {
    ensure_not_blocked(actor)?;
    if !actor.is_signed_in() && !actor.is_admin {
        return Err(AppError::LoginRequired(format!(
            "Anda harus login untuk {action}."
        )));
    }
    Ok(())
}

pub fn require_admin(actor: &ActorContext) -> Result<(), AppError> {
    if !actor.is_admin {
        return Err(AppError::Forbidden(
            "Hanya admin yang dapat melakukan tindakan ini.".to_string(),
        ));
    }
    Ok(())
}

pub fn can_modify_post(actor: &ActorContext, post: &Post) -> bool {
    actor.is_admin || actor.owns(post.author.id)
}

pub fn can_modify_guide(actor: &ActorContext, guide: &Guide) -> bool {
    actor.is_admin || actor.owns(guide.profile_id)
}

pub fn ensure_can_modify_post(actor: &ActorContext, post: &Post) -> Result<(), AppError> {
    if !can_modify_post(actor, post) {
        return Err(AppError::Forbidden(
            "Anda hanya dapat mengubah komentar milik Anda sendiri.".to_string(),
        ));
    }
    Ok(())
}

pub fn ensure_can_modify_guide(actor: &ActorContext, guide: &Guide) -> Result<(), AppError> {
    if !can_modify_guide(actor, guide) {
        return Err(AppError::Forbidden(
            "Anda hanya dapat mengubah panduan milik Anda sendiri.".to_string(),
        ));
    }
    Ok(())
}

/// Posts can be reported by members, only when written by an account, and
/// never by their own author.
pub fn ensure_can_report_post(actor: &ActorContext, post: &Post) -> Result<(), AppError> {
    require_member(actor, "melaporkan komentar")?;
    if !post.has_account_author() {
        return Err(AppError::Forbidden(
            "Komentar ini tidak dapat dilaporkan.".to_string(),
        ));
    }
    if actor.owns(post.author.id) {
        return Err(AppError::validation(
            "Anda tidak dapat melaporkan komentar sendiri.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActorId, PostAuthor, Profile, ReportLedger};
    use uuid::Uuid;

    fn profile(blocked: bool) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            display_name: "Budi".to_string(),
            is_blocked: blocked,
        }
    }

    fn post_by(author: Option<Uuid>) -> Post {
        Post {
            id: Uuid::new_v4(),
            thread_id: Uuid::new_v4(),
            author: PostAuthor {
                id: author,
                display_name: "Sari".to_string(),
                is_blocked: false,
            },
            text: "halo".to_string(),
            reports: ReportLedger::default(),
            created_at: None,
        }
    }

    #[test]
    fn test_blocked_account_is_refused() {
        let blocked = ActorContext::account(profile(true));
        assert_eq!(ensure_not_blocked(&blocked), Err(AppError::AccountBlocked));
        assert_eq!(
            require_member(&blocked, "berkomentar"),
            Err(AppError::AccountBlocked)
        );
        assert!(ensure_not_blocked(&blocked.with_admin(true)).is_ok());
    }

    #[test]
    fn test_guests_need_login_for_member_actions() {
        let guest = ActorContext::guest(ActorId::generate_guest());
        assert!(ensure_not_blocked(&guest).is_ok());
        assert!(matches!(
            require_member(&guest, "membuat diskusi"),
            Err(AppError::LoginRequired(_))
        ));
        assert!(require_member(&guest.with_admin(true), "membuat diskusi").is_ok());
    }

    #[test]
    fn test_only_owner_or_admin_modifies_post() {
        let me = profile(false);
        let actor = ActorContext::account(me.clone());
        assert!(can_modify_post(&actor, &post_by(Some(me.id))));
        assert!(!can_modify_post(&actor, &post_by(Some(Uuid::new_v4()))));
        assert!(!can_modify_post(&actor, &post_by(None)));
        assert!(can_modify_post(&actor.with_admin(true), &post_by(None)));
    }

    #[test]
    fn test_report_post_eligibility() {
        let me = profile(false);
        let actor = ActorContext::account(me.clone());
        assert!(ensure_can_report_post(&actor, &post_by(Some(Uuid::new_v4()))).is_ok());
        assert!(matches!(
            ensure_can_report_post(&actor, &post_by(Some(me.id))),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ensure_can_report_post(&actor, &post_by(None)),
            Err(AppError::Forbidden(_))
        ));
        let guest = ActorContext::guest(ActorId::generate_guest());
        assert!(matches!(
            ensure_can_report_post(&guest, &post_by(Some(me.id))),
            Err(AppError::LoginRequired(_))
        ));
    }

    #[test]
    fn test_admin_only() {
        let actor = ActorContext::account(profile(false));
        assert!(require_admin(&actor).is_err());
        assert!(require_admin(&actor.with_admin(true)).is_ok());
    }
}
