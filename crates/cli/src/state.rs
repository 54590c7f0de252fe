//! Session wrapper around an open catalog.
//!
//! Holds the catalog behind the object-safe `ItemDb` trait plus the
//! per-command deadline, and turns a [`CliAction`] into an [`Output`].

use std::sync::Arc;
use std::time::Duration;

use skudb_catalog::{CatalogResult, ItemDb, NewItem};
use skudb_core::OpContext;

use crate::format::Output;
use crate::parse::CliAction;

/// Wraps the catalog handle for command execution.
pub struct SessionState {
    db: Arc<dyn ItemDb>,
    timeout: Option<Duration>,
}

impl SessionState {
    /// Create a session over `db`.
    pub fn new(db: Arc<dyn ItemDb>, timeout: Option<Duration>) -> Self {
        Self { db, timeout }
    }

    fn context(&self) -> OpContext {
        match self.timeout {
            Some(t) => OpContext::with_timeout(t),
            None => OpContext::background(),
        }
    }

    /// Execute one action with a fresh context.
    pub fn execute(&self, action: CliAction) -> CatalogResult<Output> {
        let ctx = self.context();
        let output = match action {
            CliAction::Add { name } => Output::Item(self.db.add(&ctx, NewItem::new(name))?),
            CliAction::Get { id } => Output::Item(self.db.get(&ctx, &id)?),
            CliAction::Sku { sku } => Output::Item(self.db.get_by_sku(&ctx, sku)?),
            CliAction::List => Output::Items(self.db.list(&ctx)?),
            CliAction::Skus => Output::Skus(self.db.list_skus(&ctx)?),
            CliAction::Update { id, name } => {
                let mut item = self.db.get(&ctx, &id)?;
                item.name = name;
                self.db.update(&ctx, item)?;
                Output::Item(self.db.get(&ctx, &id)?)
            }
            CliAction::Delete { id } => {
                self.db.delete(&ctx, &id)?;
                Output::Done
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skudb_catalog::{CatalogConfig, ItemCatalog};
    use skudb_engine::Database;

    fn session() -> SessionState {
        let catalog =
            ItemCatalog::open(Arc::new(Database::ephemeral()), CatalogConfig::default()).unwrap();
        SessionState::new(Arc::new(catalog), None)
    }

    fn added(s: &SessionState, name: &str) -> skudb_catalog::Item {
        match s.execute(CliAction::Add { name: name.into() }).unwrap() {
            Output::Item(item) => item,
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_add_update_delete_flow() {
        let s = session();
        let spoon = added(&s, "spoon");
        assert_eq!(spoon.sku, 1000);

        let renamed = s
            .execute(CliAction::Update {
                id: spoon.id.clone(),
                name: "ladle".into(),
            })
            .unwrap();
        match renamed {
            Output::Item(item) => {
                assert_eq!(item.name, "ladle");
                assert_eq!(item.sku, 1000);
            }
            other => panic!("unexpected output {:?}", other),
        }

        assert_eq!(s.execute(CliAction::Delete { id: spoon.id.clone() }).unwrap(), Output::Done);
        assert!(s.execute(CliAction::Get { id: spoon.id }).unwrap_err().is_not_found());
    }

    #[test]
    fn test_listing_commands() {
        let s = session();
        let spoon = added(&s, "spoon");
        let spork = added(&s, "spork");

        match s.execute(CliAction::Skus).unwrap() {
            Output::Skus(skus) => {
                assert_eq!(skus["1000"], spoon.id);
                assert_eq!(skus["1001"], spork.id);
            }
            other => panic!("unexpected output {:?}", other),
        }
        match s.execute(CliAction::Sku { sku: 1001 }).unwrap() {
            Output::Item(item) => assert_eq!(item, spork),
            other => panic!("unexpected output {:?}", other),
        }
        match s.execute(CliAction::List).unwrap() {
            Output::Items(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected output {:?}", other),
        }
    }
}
