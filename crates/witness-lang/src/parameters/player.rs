use std::sync::Arc;

use tracing::debug;
use witness_proto::{keys, DataKey, PlayerDirectory, Query, QuerySession};

use super::{one_of, split_values};
use crate::error::ParameterError;
use crate::handler::{ParameterHandler, PendingConditions};

/// `p:Alice,Bob` restricts results to records caused by the named players;
/// `rc:Alice` to records whose recipient is the named player.
///
/// Names are resolved to identifiers through the [`PlayerDirectory`] after
/// the synchronous compile pass.
pub struct PlayerParameter {
    name: &'static str,
    aliases: &'static [&'static str],
    field: DataKey,
    directory: Arc<dyn PlayerDirectory>,
}

impl PlayerParameter {
    pub fn new(directory: Arc<dyn PlayerDirectory>) -> Self {
        Self {
            name: "player",
            aliases: &["p", "player"],
            field: keys::player_id(),
            directory,
        }
    }

    /// Players on the receiving end of an event, such as a private message.
    pub fn recipient(directory: Arc<dyn PlayerDirectory>) -> Self {
        Self {
            name: "recipient",
            aliases: &["rc", "recipient"],
            field: keys::recipient(),
            directory,
        }
    }

    pub fn field(&self) -> &DataKey {
        &self.field
    }
}

fn is_player_name(name: &str) -> bool {
    (1..=16).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl ParameterHandler for PlayerParameter {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&'static str] {
        self.aliases
    }

    fn accepts_value(&self, value: &str) -> bool {
        !value.is_empty() && value.split(',').all(is_player_name)
    }

    fn build_for_query(
        &self,
        _session: &QuerySession,
        _alias: &str,
        value: &str,
        _query: &mut Query,
    ) -> Result<Option<PendingConditions>, ParameterError> {
        let names: Vec<String> = split_values(value).into_iter().map(String::from).collect();
        let directory = Arc::clone(&self.directory);
        let field = self.field.clone();

        Ok(Some(Box::pin(async move {
            let mut ids = Vec::with_capacity(names.len());
            for name in &names {
                let id = directory.resolve_id(name).await.ok_or_else(|| {
                    ParameterError::resolution(format!("Could not find a player named '{name}'"))
                })?;
                debug!(player = %name, id = %id, field = %field, "Resolved player parameter");
                ids.push(id.to_string());
            }
            Ok(vec![one_of(field, ids)?.into()])
        })))
    }
}
