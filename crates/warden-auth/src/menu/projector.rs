//! Keeps the visible menu in step with the session and the hide set.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use warden_entity::menu::{LocalHideSet, MenuNode};

use crate::session::SessionSnapshot;

use super::resolver::MenuVisibilityResolver;

/// Visible menu for one session snapshot and hide set.
///
/// An unauthenticated session sees nothing.
pub fn project(
    resolver: &MenuVisibilityResolver,
    session: &SessionSnapshot,
    hidden: &LocalHideSet,
) -> Vec<MenuNode> {
    if !session.is_authenticated() {
        return Vec::new();
    }
    resolver.resolve(&session.permissions, hidden)
}

/// Recomputes the visible menu whenever the session or the hide set changes.
///
/// [`visible`](Self::visible) always reads the latest inputs directly. A
/// background task additionally pushes every recomputed menu to
/// [`subscribe`](Self::subscribe) receivers.
#[derive(Debug)]
pub struct MenuProjector {
    resolver: MenuVisibilityResolver,
    session: watch::Receiver<SessionSnapshot>,
    hidden: watch::Receiver<LocalHideSet>,
    menu: watch::Receiver<Vec<MenuNode>>,
    task: JoinHandle<()>,
}

impl MenuProjector {
    /// Start projecting. Must be called inside a tokio runtime.
    pub fn spawn(
        resolver: MenuVisibilityResolver,
        session: watch::Receiver<SessionSnapshot>,
        hidden: watch::Receiver<LocalHideSet>,
    ) -> Self {
        let initial = project(&resolver, &session.borrow(), &hidden.borrow());
        let (tx, menu) = watch::channel(initial);

        let task = tokio::spawn(run(
            resolver.clone(),
            session.clone(),
            hidden.clone(),
            tx,
        ));

        Self {
            resolver,
            session,
            hidden,
            menu,
            task,
        }
    }

    /// The menu for the latest session and hide set.
    pub fn visible(&self) -> Vec<MenuNode> {
        project(&self.resolver, &self.session.borrow(), &self.hidden.borrow())
    }

    /// Receiver of recomputed menus.
    pub fn subscribe(&self) -> watch::Receiver<Vec<MenuNode>> {
        self.menu.clone()
    }

    /// The resolver in use.
    pub fn resolver(&self) -> &MenuVisibilityResolver {
        &self.resolver
    }
}

impl Drop for MenuProjector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    resolver: MenuVisibilityResolver,
    mut session: watch::Receiver<SessionSnapshot>,
    mut hidden: watch::Receiver<LocalHideSet>,
    tx: watch::Sender<Vec<MenuNode>>,
) {
    loop {
        tokio::select! {
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = hidden.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        let next = project(
            &resolver,
            &session.borrow_and_update(),
            &hidden.borrow_and_update(),
        );
        debug!(roots = next.len(), "Visible menu recomputed");
        tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use warden_entity::menu::node::find_in;

    use super::*;
    use crate::menu::catalog::system_menu;
    use crate::menu::local_hide::LocalHideStore;
    use crate::rbac::PermissionSet;
    use crate::session::SessionState;

    fn signed_in(permissions: &[&str], generation: u64) -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::anonymous(generation);
        snapshot.state = SessionState::Authenticated;
        snapshot.permissions = permissions.iter().copied().collect::<PermissionSet>();
        snapshot
    }

    #[test]
    fn test_anonymous_sees_nothing() {
        let resolver = MenuVisibilityResolver::new(system_menu());
        let menu = project(&resolver, &SessionSnapshot::default(), &LocalHideSet::new());
        assert!(menu.is_empty());
    }

    #[tokio::test]
    async fn test_visible_tracks_latest_inputs() {
        let (session_tx, session_rx) = watch::channel(signed_in(&["角色管理"], 1));
        let hides = LocalHideStore::in_memory().await.unwrap();
        let projector = MenuProjector::spawn(
            MenuVisibilityResolver::new(system_menu()),
            session_rx,
            hides.subscribe(),
        );

        assert!(find_in(&projector.visible(), "role").is_some());

        hides.toggle("role").await.unwrap();
        assert!(find_in(&projector.visible(), "role").is_none());

        hides.toggle("role").await.unwrap();
        session_tx.send_replace(signed_in(&[], 2));
        assert!(find_in(&projector.visible(), "role").is_none());
        assert!(find_in(&projector.visible(), "dashboard").is_some());
    }

    #[tokio::test]
    async fn test_subscribers_receive_recomputed_menu() {
        let (session_tx, session_rx) = watch::channel(SessionSnapshot::default());
        let hides = LocalHideStore::in_memory().await.unwrap();
        let projector = MenuProjector::spawn(
            MenuVisibilityResolver::new(system_menu()),
            session_rx,
            hides.subscribe(),
        );
        let mut menus = projector.subscribe();
        assert!(menus.borrow_and_update().is_empty());

        session_tx.send_replace(signed_in(&["参数管理"], 1));
        tokio::time::timeout(Duration::from_secs(5), menus.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(find_in(&menus.borrow_and_update(), "param").is_some());

        session_tx.send_replace(SessionSnapshot::anonymous(2));
        tokio::time::timeout(Duration::from_secs(5), menus.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(menus.borrow_and_update().is_empty());
    }
}
