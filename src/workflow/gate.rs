use super::filter::Tab;
use super::roles::{Role, RoleState};
use super::types::{ItemType, WorkflowItem};

/// Roles that may approve an item of the given type, owners aside.
/// Edits and comments are owner-only, so editors can never approve edits.
fn approving_roles(item_type: ItemType) -> &'static [Role] {
    match item_type {
        ItemType::Edit | ItemType::Comment => &[],
        ItemType::Suggestion => &[Role::Coauthor],
        ItemType::Translation => &[Role::Reviewer],
        ItemType::Review => &[Role::Coauthor, Role::Producer],
        ItemType::Task => &[Role::Producer, Role::Coauthor],
    }
}

/// Whether the actor may decide on `item`. Owners may decide anything.
pub fn can_approve(item: &WorkflowItem, roles: &RoleState) -> bool {
    if roles.is_owner_like() {
        return true;
    }
    approving_roles(item.item_type)
        .iter()
        .any(|role| roles.has(*role))
}

/// True if the actor can approve at least one kind of item.
pub fn approves_anything(roles: &RoleState) -> bool {
    roles.is_owner_like()
        || [Role::Coauthor, Role::Reviewer, Role::Producer]
            .iter()
            .any(|role| roles.has(*role))
}

/// Tabs shown to the actor, in display order. The pending-approvals tab is
/// hidden from actors who cannot approve anything.
pub fn visible_tabs(roles: &RoleState) -> Vec<Tab> {
    let mut tabs = Vec::with_capacity(3);
    if approves_anything(roles) {
        tabs.push(Tab::PendingApprovals);
    }
    tabs.push(Tab::AllRequests);
    tabs.push(Tab::MySubmissions);
    tabs
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::workflow::roles::resolve_roles;
    use crate::workflow::types::*;

    fn item(item_type: ItemType) -> WorkflowItem {
        WorkflowItem {
            key: ItemKey::Generic { id: 1 },
            item_type,
            title: None,
            description: None,
            content: None,
            original_content: None,
            author: Author {
                id: 5,
                name: "Sam".to_string(),
                avatar: None,
                role: Role::Editor,
                roles: vec![Role::Editor],
            },
            status: ItemStatus::PendingApproval,
            priority: Priority::Medium,
            category: Category::Content,
            review_notes: None,
            approver: None,
            tags: vec![],
            word_count: None,
            chapter_reference: None,
            editor: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn holding(roles: &[Role]) -> RoleState {
        RoleState {
            is_owner: false,
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn owner_approves_every_type() {
        let owner = resolve_roles(1, 1, &[]);
        for t in [
            ItemType::Edit,
            ItemType::Comment,
            ItemType::Suggestion,
            ItemType::Translation,
            ItemType::Review,
            ItemType::Task,
        ] {
            assert!(can_approve(&item(t), &owner), "owner should approve {t:?}");
        }
    }

    #[test]
    fn editor_never_approves_edits() {
        let edit = item(ItemType::Edit);
        assert!(!can_approve(&edit, &holding(&[Role::Editor])));
        assert!(!can_approve(
            &edit,
            &holding(&[Role::Editor, Role::Coauthor, Role::Reviewer, Role::Producer])
        ));
        assert!(can_approve(&edit, &holding(&[Role::Editor, Role::Owner])));
    }

    #[test]
    fn type_specific_rules() {
        assert!(can_approve(&item(ItemType::Suggestion), &holding(&[Role::Coauthor])));
        assert!(!can_approve(&item(ItemType::Suggestion), &holding(&[Role::Reviewer])));
        assert!(can_approve(&item(ItemType::Translation), &holding(&[Role::Reviewer])));
        assert!(!can_approve(&item(ItemType::Translation), &holding(&[Role::Coauthor])));
        assert!(can_approve(&item(ItemType::Review), &holding(&[Role::Producer])));
        assert!(can_approve(&item(ItemType::Task), &holding(&[Role::Coauthor])));
        assert!(!can_approve(&item(ItemType::Task), &holding(&[Role::Viewer])));
    }

    #[test]
    fn pending_tab_hidden_without_approval_rights() {
        assert_eq!(
            visible_tabs(&holding(&[Role::Editor])),
            vec![Tab::AllRequests, Tab::MySubmissions]
        );
        assert_eq!(visible_tabs(&holding(&[Role::Reviewer]))[0], Tab::PendingApprovals);
    }
}
