use crate::domain::post::Post;
use crate::domain::user::User;

/// Pure moderation policy. The stores enforce these at their boundary, so a
/// misbehaving caller cannot bypass them.

/// Authors may edit their own post only while it is still pending approval.
pub fn can_edit(post: &Post, actor: &User) -> bool {
    actor.id == post.author_id && !post.is_approved
}

pub fn can_moderate(actor: &User) -> bool {
    actor.role.is_admin()
}

/// The author may always delete their own post; admins may delete any.
pub fn can_delete(post: &Post, actor: &User) -> bool {
    actor.id == post.author_id || can_moderate(actor)
}
