//! Registry of parameter and flag handlers.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};
use witness_proto::PlayerDirectory;

use crate::config::QueryConfig;
use crate::error::RegistryError;
use crate::flags::{
    GlobalFlag, IgnoreDefaultFlag, OrderFlag, SelectionFlag, SelectionProvider, SwitchFlag,
};
use crate::handler::{FlagHandler, ParameterHandler};
use crate::parameters::{
    CustomItemParameter, EventParameter, FieldParameter, IpParameter, PlayerParameter,
    RadiusParameter, TextParameter, TimeParameter,
};

/// Ordered collections of parameter and flag handlers.
///
/// Handlers may be added or removed at runtime. A compile works on a
/// snapshot taken when it starts, so registration never blocks an
/// in-flight search.
#[derive(Default)]
pub struct HandlerRegistry {
    parameters: RwLock<Vec<Arc<dyn ParameterHandler>>>,
    flags: RwLock<Vec<Arc<dyn FlagHandler>>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in handler.
    ///
    /// The ignore-default and global flags are only offered when defaults
    /// are enabled.
    pub fn with_builtins(
        config: &QueryConfig,
        directory: Arc<dyn PlayerDirectory>,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new();

        registry.register_parameter_handler(Arc::new(EventParameter))?;
        let player = PlayerParameter::new(Arc::clone(&directory));
        registry.register_parameter_handler(Arc::new(player))?;
        registry.register_parameter_handler(Arc::new(PlayerParameter::recipient(directory)))?;
        registry.register_parameter_handler(Arc::new(RadiusParameter::new(
            config.default_radius,
            config.radius_limit,
        )))?;
        registry.register_parameter_handler(Arc::new(TimeParameter::new(
            config.default_search_time.clone(),
        )))?;
        registry.register_parameter_handler(Arc::new(FieldParameter::world()))?;
        registry.register_parameter_handler(Arc::new(FieldParameter::cause()))?;
        registry.register_parameter_handler(Arc::new(FieldParameter::block()))?;
        registry.register_parameter_handler(Arc::new(FieldParameter::item()))?;
        registry.register_parameter_handler(Arc::new(FieldParameter::entity()))?;
        registry.register_parameter_handler(Arc::new(FieldParameter::target()))?;
        registry.register_parameter_handler(Arc::new(TextParameter::message()))?;
        registry.register_parameter_handler(Arc::new(TextParameter::item_name()))?;
        registry.register_parameter_handler(Arc::new(TextParameter::item_desc()))?;
        registry.register_parameter_handler(Arc::new(IpParameter))?;
        registry.register_parameter_handler(Arc::new(CustomItemParameter))?;

        registry.register_flag_handler(Arc::new(SwitchFlag::extended()));
        registry.register_flag_handler(Arc::new(SwitchFlag::no_group()));
        registry.register_flag_handler(Arc::new(SwitchFlag::no_chat()));
        registry.register_flag_handler(Arc::new(SwitchFlag::drain()));
        registry.register_flag_handler(Arc::new(OrderFlag));
        if config.defaults_enabled {
            registry.register_flag_handler(Arc::new(IgnoreDefaultFlag));
            registry.register_flag_handler(Arc::new(GlobalFlag));
        }

        info!(
            parameters = registry.parameters.read().len(),
            flags = registry.flags.read().len(),
            "Registered built-in search handlers"
        );
        Ok(registry)
    }

    /// Add a parameter handler.
    ///
    /// Fails if any of its aliases is already handled.
    pub fn register_parameter_handler(
        &self,
        handler: Arc<dyn ParameterHandler>,
    ) -> Result<(), RegistryError> {
        let mut parameters = self.parameters.write();
        for alias in handler.aliases() {
            if let Some(existing) = parameters.iter().find(|h| h.handles(alias)) {
                return Err(RegistryError::AliasConflict {
                    alias: alias.to_string(),
                    handler: handler.name().to_string(),
                    existing: existing.name().to_string(),
                });
            }
        }
        debug!(handler = handler.name(), "Registered parameter handler");
        parameters.push(handler);
        Ok(())
    }

    /// Add a flag handler.
    pub fn register_flag_handler(&self, handler: Arc<dyn FlagHandler>) {
        debug!(handler = handler.name(), "Registered flag handler");
        self.flags.write().push(handler);
    }

    /// Add a flag handler unless one matching `exists` is present.
    ///
    /// Returns `true` if the handler was added.
    pub fn register_flag_handler_unless<F>(&self, handler: Arc<dyn FlagHandler>, exists: F) -> bool
    where
        F: Fn(&dyn FlagHandler) -> bool,
    {
        let mut flags = self.flags.write();
        if flags.iter().any(|h| exists(h.as_ref())) {
            return false;
        }
        debug!(handler = handler.name(), "Registered flag handler");
        flags.push(handler);
        true
    }

    /// Remove every flag handler matching `predicate`. Returns how many were
    /// removed.
    pub fn remove_flag_handlers<F>(&self, predicate: F) -> usize
    where
        F: Fn(&dyn FlagHandler) -> bool,
    {
        let mut flags = self.flags.write();
        let before = flags.len();
        flags.retain(|h| !predicate(h.as_ref()));
        before - flags.len()
    }

    /// Install or remove the region selection flag.
    pub fn set_selection_provider(&self, provider: Option<Arc<dyn SelectionProvider>>) {
        let is_selection = |h: &dyn FlagHandler| h.name() == SelectionFlag::NAME;
        match provider {
            Some(provider) => {
                if self.register_flag_handler_unless(
                    Arc::new(SelectionFlag::new(provider)),
                    is_selection,
                ) {
                    info!("Region selection integration enabled");
                }
            }
            None => {
                if self.remove_flag_handlers(is_selection) > 0 {
                    info!("Region selection integration disabled");
                }
            }
        }
    }

    /// First parameter handler answering to `alias`.
    pub fn parameter_handler(&self, alias: &str) -> Option<Arc<dyn ParameterHandler>> {
        self.parameters
            .read()
            .iter()
            .find(|h| h.handles(alias))
            .cloned()
    }

    /// First flag handler answering to `alias`.
    pub fn flag_handler(&self, alias: &str) -> Option<Arc<dyn FlagHandler>> {
        self.flags.read().iter().find(|h| h.handles(alias)).cloned()
    }

    /// Snapshot of the parameter handlers in registration order.
    pub fn parameter_handlers(&self) -> Vec<Arc<dyn ParameterHandler>> {
        self.parameters.read().clone()
    }

    /// Snapshot of the flag handlers in registration order.
    pub fn flag_handlers(&self) -> Vec<Arc<dyn FlagHandler>> {
        self.flags.read().clone()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parameters: Vec<String> = self
            .parameters
            .read()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        let flags: Vec<String> = self.flags.read().iter().map(|h| h.name().to_string()).collect();
        f.debug_struct("HandlerRegistry")
            .field("parameters", &parameters)
            .field("flags", &flags)
            .finish()
    }
}
