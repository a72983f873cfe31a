//! Table manager: the entry points request handlers call.
//!
//! Every mutating entry point runs one exclusive transaction on the
//! table, and only after it succeeded notifies the other seated players.
//! A failed action notifies nobody.

use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    config::TableConfig,
    entities::{ItemId, ItemUpdate, Player, TableId, TableItem, User, UserId},
    errors::{TableError, TableResult},
    state::{JoinedTable, Table, TableState},
};
use crate::{
    push::{Push, ViewerSession},
    registry::{TableRegistry, UserRegistry},
};

/// A name for users who never picked one.
pub fn anonymous_name() -> String {
    format!("Anon{}", rand::rng().random_range(1..10_000))
}

/// Manager for users and the tables they share
pub struct TableManager {
    /// Known users
    users: Arc<UserRegistry>,

    /// Live tables
    tables: Arc<TableRegistry>,

    /// Settings applied to new tables and subscriptions
    config: TableConfig,
}

impl TableManager {
    /// Create a new table manager
    ///
    /// # Arguments
    ///
    /// * `users` - User registry
    /// * `tables` - Table registry
    /// * `config` - Table configuration
    pub fn new(users: Arc<UserRegistry>, tables: Arc<TableRegistry>, config: TableConfig) -> Self {
        Self {
            users,
            tables,
            config,
        }
    }

    pub fn users(&self) -> &Arc<UserRegistry> {
        &self.users
    }

    pub fn tables(&self) -> &Arc<TableRegistry> {
        &self.tables
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub async fn table_count(&self) -> usize {
        self.tables.len().await
    }

    pub async fn user_count(&self) -> usize {
        self.users.len().await
    }

    /// Register a new user
    ///
    /// # Arguments
    ///
    /// * `name` - Display name; blank names get an anonymous one
    ///
    /// # Returns
    ///
    /// * `User` - The stored user
    pub async fn register_user(&self, name: &str) -> User {
        let name = match name.trim() {
            "" => anonymous_name(),
            trimmed => trimmed.to_string(),
        };
        let user = User::new(Uuid::new_v4(), name, Utc::now());
        self.users.set(user.id, user.clone()).await;
        log::info!("Registered user {} ({})", user.name, user.id);
        user
    }

    /// Look up a user
    pub async fn user(&self, user_id: UserId) -> TableResult<User> {
        self.users.get(&user_id).await.ok_or(TableError::UserNotFound)
    }

    /// Change a user's display name
    ///
    /// Seats keep the name captured when the user joined.
    ///
    /// # Returns
    ///
    /// * `TableResult<User>` - The renamed user, or `BadRequest` for a blank name
    pub async fn rename_user(&self, user_id: UserId, name: &str) -> TableResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TableError::BadRequest("name must not be empty".to_string()));
        }
        let user = self
            .users
            .update(&user_id, |user| -> TableResult<User> {
                user.name = name.to_string();
                Ok(user.clone())
            })
            .await
            .map_err(|e| match e {
                TableError::Registry(_) => TableError::UserNotFound,
                other => other,
            })?;
        log::info!("Renamed user {} to {}", user.id, user.name);
        Ok(user)
    }

    /// Create a table with a fresh deck and seat its creator
    ///
    /// # Arguments
    ///
    /// * `creator` - User creating the table
    ///
    /// # Returns
    ///
    /// * `TableResult<TableId>` - Table ID or error
    pub async fn create_table(&self, creator: &User) -> TableResult<TableId> {
        let table_id = Uuid::new_v4();
        let table = Arc::new(Table::new(table_id, &self.config));
        table.update(|t| t.join(creator)).await?;
        self.tables.set(table_id, table).await;

        log::info!("Created table {} for {}", table_id, creator.name);
        Ok(table_id)
    }

    /// Get a table
    pub async fn get_table(&self, table_id: TableId) -> TableResult<Arc<Table>> {
        self.tables
            .get(&table_id)
            .await
            .ok_or(TableError::TableNotFound)
    }

    /// Join a table
    ///
    /// # Arguments
    ///
    /// * `table_id` - Table ID
    /// * `user` - Joining user
    ///
    /// # Returns
    ///
    /// * `TableResult<Option<JoinedTable>>` - `None` if the user was already seated
    pub async fn join_table(
        &self,
        table_id: TableId,
        user: &User,
    ) -> TableResult<Option<JoinedTable>> {
        let table = self.get_table(table_id).await?;
        let joined = table
            .update(|t| {
                Ok(t.join(user)?
                    .map(|joined| (t.other_players(user.id), joined)))
            })
            .await?;

        let Some((others, joined)) = joined else {
            log::debug!("table_id={} user_name={} already seated", table_id, user.name);
            return Ok(None);
        };

        log::info!(
            "table_id={} user_name={} joined at seat {}",
            table_id,
            user.name,
            joined.player.index
        );
        others.notify_all(Push::player_joined(
            joined.players.clone(),
            joined.items.clone(),
        ));
        Ok(Some(joined))
    }

    /// Pick up an item
    pub async fn take_item(
        &self,
        table_id: TableId,
        item_id: ItemId,
        user: &User,
    ) -> TableResult<TableItem> {
        let table = self.get_table(table_id).await?;
        let (others, item) = table
            .update(|t| {
                let item = t.take_item(item_id, user.id)?;
                Ok((t.other_players(user.id), item))
            })
            .await?;

        log::debug!("table_id={} user_name={} took {}", table_id, user.name, item_id);
        others.notify_all(Push::update_items(vec![item.clone()]));
        Ok(item)
    }

    /// Turn an owned card face up
    pub async fn show_item(
        &self,
        table_id: TableId,
        item_id: ItemId,
        user: &User,
    ) -> TableResult<TableItem> {
        let table = self.get_table(table_id).await?;
        let (others, item) = table
            .update(|t| {
                let item = t.show_item(item_id, user.id)?;
                Ok((t.other_players(user.id), item))
            })
            .await?;

        log::debug!("table_id={} user_name={} showed {}", table_id, user.name, item_id);
        others.notify_all(Push::update_items(vec![item.clone()]));
        Ok(item)
    }

    /// Move or turn an item
    pub async fn update_item(
        &self,
        table_id: TableId,
        proposed: &ItemUpdate,
        user: &User,
    ) -> TableResult<TableItem> {
        let table = self.get_table(table_id).await?;
        let (others, item) = table
            .update(|t| {
                let item = t.update_item(proposed, user.id)?;
                Ok((t.other_players(user.id), item))
            })
            .await?;

        log::debug!(
            "table_id={} user_name={} moved {} to ({}, {})",
            table_id,
            user.name,
            item.id,
            item.x,
            item.y
        );
        others.notify_all(Push::update_items(vec![item.clone()]));
        Ok(item)
    }

    /// Gather and reshuffle every card
    pub async fn shuffle(&self, table_id: TableId, user: &User) -> TableResult<()> {
        let table = self.get_table(table_id).await?;
        let others = table
            .update(|t| {
                t.shuffle(user.id)?;
                Ok(t.other_players(user.id))
            })
            .await?;

        log::info!("table_id={} user_name={} reshuffled", table_id, user.name);
        others.notify_all(Push::Refresh);
        Ok(())
    }

    /// The table as `viewer` may see it
    pub async fn table_state(&self, table_id: TableId, viewer: &User) -> TableResult<TableState> {
        let table = self.get_table(table_id).await?;
        let mut state = table
            .read(|t| {
                t.ensure_seated(viewer.id)?;
                Ok(t.deep_copy())
            })
            .await?;
        state.apply_visibility(viewer.id);
        Ok(state)
    }

    /// Seated players ordered by seat
    pub async fn seated_players(&self, table_id: TableId, viewer: &User) -> TableResult<Vec<Player>> {
        let table = self.get_table(table_id).await?;
        table
            .read(|t| {
                t.ensure_seated(viewer.id)?;
                Ok(t.players_by_seat())
            })
            .await
    }

    /// Attach a push stream for `viewer`, replacing any earlier one
    ///
    /// # Returns
    ///
    /// * `TableResult<ViewerSession>` - Session to run over the viewer's connection
    pub async fn subscribe(&self, table_id: TableId, viewer: &User) -> TableResult<ViewerSession> {
        let table = self.get_table(table_id).await?;
        let buffer = self.config.push_buffer;
        let (mailbox, subscription) = table
            .read(|t| {
                let mailbox = t.ensure_seated(viewer.id)?.mailbox().clone();
                let subscription = mailbox.subscribe(buffer);
                Ok((mailbox, subscription))
            })
            .await?;

        log::info!(
            "table_id={} user_name={} listening (subscription {})",
            table_id,
            viewer.name,
            subscription.id
        );
        Ok(ViewerSession::new(
            viewer.clone(),
            mailbox,
            subscription,
            self.config.keepalive(),
        ))
    }

    /// Copies of every user and every table, for persistence
    pub async fn snapshot(&self) -> (Vec<User>, Vec<TableState>) {
        let users = self.users.values().await;
        let mut tables = Vec::new();
        for table in self.tables.values().await {
            tables.push(table.deep_copy().await);
        }
        (users, tables)
    }

    /// Load previously saved users and tables
    ///
    /// # Returns
    ///
    /// * `(usize, usize)` - Number of users and tables loaded
    pub async fn restore(&self, users: Vec<User>, tables: Vec<TableState>) -> (usize, usize) {
        let counts = (users.len(), tables.len());
        self.users.extend(users, |user| user.id).await;
        self.tables
            .extend(
                tables.into_iter().map(|state| Arc::new(Table::from_state(state))),
                |table| table.id(),
            )
            .await;
        log::info!("Restored {} users and {} tables", counts.0, counts.1);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::entities::{Class, Side};

    fn manager() -> TableManager {
        TableManager::new(
            Arc::new(UserRegistry::new()),
            Arc::new(TableRegistry::new()),
            TableConfig::default(),
        )
    }

    #[test]
    fn test_anonymous_name_shape() {
        let name = anonymous_name();
        let n: u32 = name.strip_prefix("Anon").unwrap().parse().unwrap();
        assert!((1..10_000).contains(&n));
    }

    #[tokio::test]
    async fn test_register_and_rename_user() {
        let manager = manager();
        let user = manager.register_user("  alice ").await;
        assert_eq!(user.name, "alice");
        assert_eq!(manager.user(user.id).await.unwrap(), user);

        let renamed = manager.rename_user(user.id, " bob ").await.unwrap();
        assert_eq!(renamed.name, "bob");
        assert!(matches!(
            manager.rename_user(user.id, "   ").await,
            Err(TableError::BadRequest(_))
        ));
        assert!(matches!(
            manager.rename_user(Uuid::new_v4(), "carol").await,
            Err(TableError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_blank_name_becomes_anonymous() {
        let user = manager().register_user("").await;
        assert!(user.name.starts_with("Anon"));
    }

    #[tokio::test]
    async fn test_create_table_seats_creator() {
        let manager = manager();
        let alice = manager.register_user("alice").await;

        let table_id = manager.create_table(&alice).await.unwrap();

        let players = manager.seated_players(table_id, &alice).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id(), alice.id);
        assert_eq!(manager.table_count().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let manager = manager();
        let alice = manager.register_user("alice").await;
        assert!(matches!(
            manager.join_table(Uuid::new_v4(), &alice).await,
            Err(TableError::TableNotFound)
        ));
    }

    #[tokio::test]
    async fn test_state_requires_seat_and_is_filtered() {
        let manager = manager();
        let alice = manager.register_user("alice").await;
        let bob = manager.register_user("bob").await;
        let table_id = manager.create_table(&alice).await.unwrap();

        assert!(matches!(
            manager.table_state(table_id, &bob).await,
            Err(TableError::NotSeated)
        ));

        manager.join_table(table_id, &bob).await.unwrap();
        let taken = manager.take_item(table_id, 1, &alice).await.unwrap();
        manager.show_item(table_id, taken.id, &alice).await.unwrap();

        let for_bob = manager.table_state(table_id, &bob).await.unwrap();
        let card = for_bob.item(1).unwrap().as_card().unwrap();
        assert_eq!(card.side, Side::Cover);
        assert!(card.is_blank());

        let for_alice = manager.table_state(table_id, &alice).await.unwrap();
        assert_eq!(for_alice.item(1).unwrap().side(), Some(Side::Face));
    }

    #[tokio::test]
    async fn test_snapshot_and_restore() {
        let source = manager();
        let alice = source.register_user("alice").await;
        let table_id = source.create_table(&alice).await.unwrap();
        source.take_item(table_id, 3, &alice).await.unwrap();

        let (users, tables) = source.snapshot().await;
        let target = manager();
        assert_eq!(target.restore(users, tables).await, (1, 1));

        let state = target.table_state(table_id, &alice).await.unwrap();
        assert!(state.item(3).unwrap().is_owned_by(alice.id));
        assert!(state.items.iter().any(|i| i.is(Class::Dealer)));
    }
}
